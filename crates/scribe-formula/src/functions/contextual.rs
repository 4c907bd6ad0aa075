//! Contextual functions
//!
//! `GET` and `MENTION` read the evaluation context synchronously.
//! `WEATHER`, `DISTANCE` and `ROUTE` go through the context's
//! [`ExternalServices`](scribe_core::ExternalServices) providers; the
//! evaluator awaits them under its timeout.

use futures::future::BoxFuture;

use crate::error::{FormulaError, FormulaResult};
use crate::functions::text_arg;
use scribe_core::{FormulaContext, ServiceError, Value};

/// GET(field)
///
/// Field lookup is permissive: an absent field is null, not an error.
pub fn fn_get(args: &[Value], ctx: &FormulaContext) -> FormulaResult<Value> {
    let field = text_arg("GET", args, 0)?;
    Ok(ctx.field(field).cloned().unwrap_or(Value::Null))
}

/// MENTION(name)
///
/// Resolves a mentioned entity by display name (case-insensitive); null
/// when the document does not mention it.
pub fn fn_mention(args: &[Value], ctx: &FormulaContext) -> FormulaResult<Value> {
    let name = text_arg("MENTION", args, 0)?;
    Ok(ctx
        .mention(name)
        .map(|m| Value::text(m.name.clone()))
        .unwrap_or(Value::Null))
}

/// WEATHER(location) - external I/O
pub fn fn_weather<'a>(
    args: &'a [Value],
    ctx: &'a FormulaContext,
) -> BoxFuture<'a, FormulaResult<Value>> {
    Box::pin(async move {
        let location = text_arg("WEATHER", args, 0)?;
        ctx.services
            .weather(location)
            .await
            .map_err(|e| service_error("WEATHER", e))
    })
}

/// DISTANCE(from, to) - external I/O
pub fn fn_distance<'a>(
    args: &'a [Value],
    ctx: &'a FormulaContext,
) -> BoxFuture<'a, FormulaResult<Value>> {
    Box::pin(async move {
        let from = text_arg("DISTANCE", args, 0)?;
        let to = text_arg("DISTANCE", args, 1)?;
        ctx.services
            .distance(from, to)
            .await
            .map_err(|e| service_error("DISTANCE", e))
    })
}

/// ROUTE(from, to) - external I/O
pub fn fn_route<'a>(
    args: &'a [Value],
    ctx: &'a FormulaContext,
) -> BoxFuture<'a, FormulaResult<Value>> {
    Box::pin(async move {
        let from = text_arg("ROUTE", args, 0)?;
        let to = text_arg("ROUTE", args, 1)?;
        ctx.services
            .route(from, to)
            .await
            .map_err(|e| service_error("ROUTE", e))
    })
}

fn service_error(function: &str, err: ServiceError) -> FormulaError {
    FormulaError::runtime(function, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{self, FutureExt};
    use pretty_assertions::assert_eq;
    use scribe_core::{EntityRef, ExternalServices, ServiceFuture};
    use std::sync::Arc;

    struct FakeServices;

    impl ExternalServices for FakeServices {
        fn weather<'a>(&'a self, location: &'a str) -> ServiceFuture<'a> {
            future::ready(Ok(Value::text(format!("sunny in {}", location)))).boxed()
        }

        fn distance<'a>(&'a self, _from: &'a str, _to: &'a str) -> ServiceFuture<'a> {
            future::ready(Ok(Value::Number(42.0))).boxed()
        }

        fn route<'a>(&'a self, from: &'a str, to: &'a str) -> ServiceFuture<'a> {
            future::ready(Ok(Value::text(format!("{} -> {}", from, to)))).boxed()
        }
    }

    #[test]
    fn test_get() {
        let ctx = FormulaContext::builder().field("price", 100.0).build();
        assert_eq!(
            fn_get(&[Value::text("price")], &ctx).unwrap(),
            Value::Number(100.0)
        );
        assert_eq!(fn_get(&[Value::text("missing")], &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn test_mention() {
        let ctx = FormulaContext::builder()
            .mention(EntityRef {
                id: "e1".into(),
                name: "Ada".into(),
                entity_type: "person".into(),
            })
            .build();

        assert_eq!(fn_mention(&[Value::text("ada")], &ctx).unwrap(), Value::text("Ada"));
        assert_eq!(fn_mention(&[Value::text("Bob")], &ctx).unwrap(), Value::Null);
    }

    #[tokio::test]
    async fn test_weather_through_services() {
        let ctx = FormulaContext::builder()
            .services(Arc::new(FakeServices))
            .build();

        let result = fn_weather(&[Value::text("Oslo")], &ctx).await.unwrap();
        assert_eq!(result, Value::text("sunny in Oslo"));
    }

    #[tokio::test]
    async fn test_distance_through_services() {
        let ctx = FormulaContext::builder()
            .services(Arc::new(FakeServices))
            .build();

        let result = fn_distance(&[Value::text("Oslo"), Value::text("Bergen")], &ctx)
            .await
            .unwrap();
        assert_eq!(result, Value::Number(42.0));
    }

    #[tokio::test]
    async fn test_unconfigured_services_are_runtime_errors() {
        let ctx = FormulaContext::builder().build();

        let err = fn_weather(&[Value::text("Oslo")], &ctx).await.unwrap_err();
        assert_eq!(
            err,
            FormulaError::runtime("WEATHER", "no weather provider configured")
        );
    }
}
