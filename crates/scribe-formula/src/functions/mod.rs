//! Built-in formula functions
//!
//! The registry is an immutable, process-wide catalog built once at startup
//! and shared read-only across concurrent evaluations.

pub mod aggregate;
pub mod contextual;
pub mod datetime;
pub mod logical;
pub mod math;
pub mod text;

use std::sync::OnceLock;

use ahash::AHashMap;
use futures::future::BoxFuture;
use serde::Serialize;

use crate::error::{FormulaError, FormulaResult};
use scribe_core::{FormulaContext, Value};

/// Function category, used for grouping in the host UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Category {
    Math,
    Text,
    DateTime,
    Logic,
    Aggregate,
    /// Reads the context or calls an external service
    Contextual,
}

/// Declared type of a parameter, used for soft type checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamType {
    Number,
    Text,
    Bool,
    DateTime,
    List,
    Any,
}

/// A declared parameter of a built-in function
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Param {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub description: &'static str,
}

/// Synchronous function implementation
pub type SyncFn = fn(&[Value], &FormulaContext) -> FormulaResult<Value>;

/// Asynchronous (I/O-bound) function implementation
pub type AsyncFn = for<'a> fn(&'a [Value], &'a FormulaContext) -> BoxFuture<'a, FormulaResult<Value>>;

/// Function implementation
///
/// Most built-ins resolve within the same tick; contextual built-ins that
/// perform network I/O are futures the evaluator awaits under a timeout.
pub enum FunctionImpl {
    Sync(SyncFn),
    Async(AsyncFn),
}

/// Function definition
pub struct FunctionDef {
    /// Canonical (uppercase) function name
    pub name: &'static str,
    /// Category for UI grouping
    pub category: Category,
    /// Declared parameters; when `variadic`, the final parameter repeats
    pub params: &'static [Param],
    /// Whether the final parameter may repeat
    pub variadic: bool,
    /// One-line description for autocomplete
    pub description: &'static str,
    /// Implementation
    pub implementation: FunctionImpl,
}

impl FunctionDef {
    /// Minimum accepted argument count
    pub fn min_args(&self) -> usize {
        self.params.iter().filter(|p| p.required).count()
    }

    /// Maximum accepted argument count (`None` = unlimited)
    pub fn max_args(&self) -> Option<usize> {
        if self.variadic {
            None
        } else {
            Some(self.params.len())
        }
    }

    /// Whether the implementation suspends for I/O
    pub fn is_async(&self) -> bool {
        matches!(self.implementation, FunctionImpl::Async(_))
    }
}

/// Serializable catalog row for host UI browsing/autocomplete
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FunctionInfo {
    pub name: &'static str,
    pub category: Category,
    pub description: &'static str,
    pub variadic: bool,
    pub params: &'static [Param],
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<String, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_math_functions();
        registry.register_text_functions();
        registry.register_datetime_functions();
        registry.register_logical_functions();
        registry.register_aggregate_functions();
        registry.register_contextual_functions();

        registry
    }

    /// Look up a function by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(&name.to_uppercase())
    }

    /// Check whether a function exists (case-insensitive)
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(&name.to_uppercase())
    }

    /// Catalog rows, sorted by category then name
    pub fn catalog(&self) -> Vec<FunctionInfo> {
        let mut infos: Vec<FunctionInfo> = self
            .functions
            .values()
            .map(|def| FunctionInfo {
                name: def.name,
                category: def.category,
                description: def.description,
                variadic: def.variadic,
                params: def.params,
            })
            .collect();
        infos.sort_by_key(|info| (info.category, info.name));
        infos
    }

    /// Register a function
    fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name.to_string(), def);
    }

    fn register_math_functions(&mut self) {
        // SUM
        self.register(FunctionDef {
            name: "SUM",
            category: Category::Math,
            params: &[Param {
                name: "value",
                ty: ParamType::Number,
                required: true,
                description: "Values to add; lists are flattened",
            }],
            variadic: true,
            description: "Add numbers together",
            implementation: FunctionImpl::Sync(math::fn_sum),
        });

        // AVERAGE
        self.register(FunctionDef {
            name: "AVERAGE",
            category: Category::Math,
            params: &[Param {
                name: "value",
                ty: ParamType::Number,
                required: true,
                description: "Values to average; lists are flattened",
            }],
            variadic: true,
            description: "Arithmetic mean of numbers",
            implementation: FunctionImpl::Sync(math::fn_average),
        });

        // MIN
        self.register(FunctionDef {
            name: "MIN",
            category: Category::Math,
            params: &[Param {
                name: "value",
                ty: ParamType::Number,
                required: true,
                description: "Candidate values",
            }],
            variadic: true,
            description: "Smallest of the given numbers",
            implementation: FunctionImpl::Sync(math::fn_min),
        });

        // MAX
        self.register(FunctionDef {
            name: "MAX",
            category: Category::Math,
            params: &[Param {
                name: "value",
                ty: ParamType::Number,
                required: true,
                description: "Candidate values",
            }],
            variadic: true,
            description: "Largest of the given numbers",
            implementation: FunctionImpl::Sync(math::fn_max),
        });

        // ROUND
        self.register(FunctionDef {
            name: "ROUND",
            category: Category::Math,
            params: &[
                Param {
                    name: "value",
                    ty: ParamType::Number,
                    required: true,
                    description: "Value to round",
                },
                Param {
                    name: "digits",
                    ty: ParamType::Number,
                    required: false,
                    description: "Decimal places (default 0)",
                },
            ],
            variadic: false,
            description: "Round to a number of decimal places",
            implementation: FunctionImpl::Sync(math::fn_round),
        });

        // ABS
        self.register(FunctionDef {
            name: "ABS",
            category: Category::Math,
            params: &[Param {
                name: "value",
                ty: ParamType::Number,
                required: true,
                description: "Value to take the absolute value of",
            }],
            variadic: false,
            description: "Absolute value",
            implementation: FunctionImpl::Sync(math::fn_abs),
        });
    }

    fn register_text_functions(&mut self) {
        // CONCAT
        self.register(FunctionDef {
            name: "CONCAT",
            category: Category::Text,
            params: &[Param {
                name: "value",
                ty: ParamType::Any,
                required: true,
                description: "Values to join; rendered as text",
            }],
            variadic: true,
            description: "Concatenate values into one text",
            implementation: FunctionImpl::Sync(text::fn_concat),
        });

        // UPPER
        self.register(FunctionDef {
            name: "UPPER",
            category: Category::Text,
            params: &[Param {
                name: "text",
                ty: ParamType::Text,
                required: true,
                description: "Text to uppercase",
            }],
            variadic: false,
            description: "Uppercase text",
            implementation: FunctionImpl::Sync(text::fn_upper),
        });

        // LOWER
        self.register(FunctionDef {
            name: "LOWER",
            category: Category::Text,
            params: &[Param {
                name: "text",
                ty: ParamType::Text,
                required: true,
                description: "Text to lowercase",
            }],
            variadic: false,
            description: "Lowercase text",
            implementation: FunctionImpl::Sync(text::fn_lower),
        });

        // LENGTH
        self.register(FunctionDef {
            name: "LENGTH",
            category: Category::Text,
            params: &[Param {
                name: "value",
                ty: ParamType::Any,
                required: true,
                description: "Text (characters) or list (elements)",
            }],
            variadic: false,
            description: "Length of text or a list",
            implementation: FunctionImpl::Sync(text::fn_length),
        });

        // TRIM
        self.register(FunctionDef {
            name: "TRIM",
            category: Category::Text,
            params: &[Param {
                name: "text",
                ty: ParamType::Text,
                required: true,
                description: "Text to trim",
            }],
            variadic: false,
            description: "Strip leading and trailing whitespace",
            implementation: FunctionImpl::Sync(text::fn_trim),
        });

        // REPLACE
        self.register(FunctionDef {
            name: "REPLACE",
            category: Category::Text,
            params: &[
                Param {
                    name: "text",
                    ty: ParamType::Text,
                    required: true,
                    description: "Text to search in",
                },
                Param {
                    name: "from",
                    ty: ParamType::Text,
                    required: true,
                    description: "Substring to replace",
                },
                Param {
                    name: "to",
                    ty: ParamType::Text,
                    required: true,
                    description: "Replacement text",
                },
            ],
            variadic: false,
            description: "Replace every occurrence of a substring",
            implementation: FunctionImpl::Sync(text::fn_replace),
        });
    }

    fn register_datetime_functions(&mut self) {
        // TODAY
        self.register(FunctionDef {
            name: "TODAY",
            category: Category::DateTime,
            params: &[],
            variadic: false,
            description: "Start of the current day (UTC)",
            implementation: FunctionImpl::Sync(datetime::fn_today),
        });

        // NOW
        self.register(FunctionDef {
            name: "NOW",
            category: Category::DateTime,
            params: &[],
            variadic: false,
            description: "Current date and time",
            implementation: FunctionImpl::Sync(datetime::fn_now),
        });

        // DATEADD
        self.register(FunctionDef {
            name: "DATEADD",
            category: Category::DateTime,
            params: &[
                Param {
                    name: "date",
                    ty: ParamType::DateTime,
                    required: true,
                    description: "Starting date",
                },
                Param {
                    name: "amount",
                    ty: ParamType::Number,
                    required: true,
                    description: "Amount to add; may be negative",
                },
                Param {
                    name: "unit",
                    ty: ParamType::Text,
                    required: true,
                    description: "years, months, weeks, days, hours, minutes or seconds",
                },
            ],
            variadic: false,
            description: "Shift a date by an amount of time",
            implementation: FunctionImpl::Sync(datetime::fn_dateadd),
        });

        // FORMATDATE
        self.register(FunctionDef {
            name: "FORMATDATE",
            category: Category::DateTime,
            params: &[
                Param {
                    name: "date",
                    ty: ParamType::DateTime,
                    required: true,
                    description: "Date to format",
                },
                Param {
                    name: "format",
                    ty: ParamType::Text,
                    required: true,
                    description: "strftime-style format string",
                },
            ],
            variadic: false,
            description: "Render a date as text",
            implementation: FunctionImpl::Sync(datetime::fn_formatdate),
        });

        // DURATION
        self.register(FunctionDef {
            name: "DURATION",
            category: Category::DateTime,
            params: &[
                Param {
                    name: "start",
                    ty: ParamType::DateTime,
                    required: true,
                    description: "Interval start",
                },
                Param {
                    name: "end",
                    ty: ParamType::DateTime,
                    required: true,
                    description: "Interval end",
                },
                Param {
                    name: "unit",
                    ty: ParamType::Text,
                    required: false,
                    description: "Unit of the result (default days)",
                },
            ],
            variadic: false,
            description: "Length of the interval between two dates",
            implementation: FunctionImpl::Sync(datetime::fn_duration),
        });

        // DAYOFWEEK
        self.register(FunctionDef {
            name: "DAYOFWEEK",
            category: Category::DateTime,
            params: &[Param {
                name: "date",
                ty: ParamType::DateTime,
                required: true,
                description: "Date to inspect",
            }],
            variadic: false,
            description: "Day of the week, 1 (Monday) through 7 (Sunday)",
            implementation: FunctionImpl::Sync(datetime::fn_dayofweek),
        });
    }

    fn register_logical_functions(&mut self) {
        // IF
        self.register(FunctionDef {
            name: "IF",
            category: Category::Logic,
            params: &[
                Param {
                    name: "condition",
                    ty: ParamType::Bool,
                    required: true,
                    description: "Condition to test",
                },
                Param {
                    name: "then",
                    ty: ParamType::Any,
                    required: true,
                    description: "Result when the condition holds",
                },
                Param {
                    name: "else",
                    ty: ParamType::Any,
                    required: false,
                    description: "Result otherwise (default null)",
                },
            ],
            variadic: false,
            description: "Choose between two values",
            implementation: FunctionImpl::Sync(logical::fn_if),
        });

        // AND
        self.register(FunctionDef {
            name: "AND",
            category: Category::Logic,
            params: &[Param {
                name: "condition",
                ty: ParamType::Bool,
                required: true,
                description: "Conditions to test",
            }],
            variadic: true,
            description: "True when every condition holds",
            implementation: FunctionImpl::Sync(logical::fn_and),
        });

        // OR
        self.register(FunctionDef {
            name: "OR",
            category: Category::Logic,
            params: &[Param {
                name: "condition",
                ty: ParamType::Bool,
                required: true,
                description: "Conditions to test",
            }],
            variadic: true,
            description: "True when any condition holds",
            implementation: FunctionImpl::Sync(logical::fn_or),
        });

        // NOT
        self.register(FunctionDef {
            name: "NOT",
            category: Category::Logic,
            params: &[Param {
                name: "condition",
                ty: ParamType::Bool,
                required: true,
                description: "Condition to negate",
            }],
            variadic: false,
            description: "Logical negation",
            implementation: FunctionImpl::Sync(logical::fn_not),
        });

        // ISEMPTY
        self.register(FunctionDef {
            name: "ISEMPTY",
            category: Category::Logic,
            params: &[Param {
                name: "value",
                ty: ParamType::Any,
                required: true,
                description: "Value to test",
            }],
            variadic: false,
            description: "True for null, empty text or an empty list",
            implementation: FunctionImpl::Sync(logical::fn_isempty),
        });

        // COALESCE
        self.register(FunctionDef {
            name: "COALESCE",
            category: Category::Logic,
            params: &[Param {
                name: "value",
                ty: ParamType::Any,
                required: true,
                description: "Candidate values",
            }],
            variadic: true,
            description: "First non-null value",
            implementation: FunctionImpl::Sync(logical::fn_coalesce),
        });

        // Comparison predicates; the grammar has no operators, so these are
        // the formula language's ordering primitives.
        self.register(FunctionDef {
            name: "EQ",
            category: Category::Logic,
            params: COMPARE_PARAMS,
            variadic: false,
            description: "True when both values are equal",
            implementation: FunctionImpl::Sync(logical::fn_eq),
        });

        self.register(FunctionDef {
            name: "NEQ",
            category: Category::Logic,
            params: COMPARE_PARAMS,
            variadic: false,
            description: "True when the values differ",
            implementation: FunctionImpl::Sync(logical::fn_neq),
        });

        self.register(FunctionDef {
            name: "GT",
            category: Category::Logic,
            params: COMPARE_PARAMS,
            variadic: false,
            description: "True when left is greater than right",
            implementation: FunctionImpl::Sync(logical::fn_gt),
        });

        self.register(FunctionDef {
            name: "GTE",
            category: Category::Logic,
            params: COMPARE_PARAMS,
            variadic: false,
            description: "True when left is at least right",
            implementation: FunctionImpl::Sync(logical::fn_gte),
        });

        self.register(FunctionDef {
            name: "LT",
            category: Category::Logic,
            params: COMPARE_PARAMS,
            variadic: false,
            description: "True when left is less than right",
            implementation: FunctionImpl::Sync(logical::fn_lt),
        });

        self.register(FunctionDef {
            name: "LTE",
            category: Category::Logic,
            params: COMPARE_PARAMS,
            variadic: false,
            description: "True when left is at most right",
            implementation: FunctionImpl::Sync(logical::fn_lte),
        });
    }

    fn register_aggregate_functions(&mut self) {
        // COUNT
        self.register(FunctionDef {
            name: "COUNT",
            category: Category::Aggregate,
            params: &[Param {
                name: "value",
                ty: ParamType::Any,
                required: true,
                description: "Values to count; lists are flattened",
            }],
            variadic: true,
            description: "Number of non-null values",
            implementation: FunctionImpl::Sync(aggregate::fn_count),
        });

        // SUMFIELD
        self.register(FunctionDef {
            name: "SUMFIELD",
            category: Category::Aggregate,
            params: &[Param {
                name: "field",
                ty: ParamType::Text,
                required: true,
                description: "Field name to sum across sibling items",
            }],
            variadic: false,
            description: "Sum a field over the document's sibling items",
            implementation: FunctionImpl::Sync(aggregate::fn_sumfield),
        });

        // FILTER
        self.register(FunctionDef {
            name: "FILTER",
            category: Category::Aggregate,
            params: &[
                Param {
                    name: "list",
                    ty: ParamType::List,
                    required: true,
                    description: "List to filter",
                },
                Param {
                    name: "match",
                    ty: ParamType::Any,
                    required: false,
                    description: "Keep elements equal to this value (default: drop nulls)",
                },
            ],
            variadic: false,
            description: "Filter a list",
            implementation: FunctionImpl::Sync(aggregate::fn_filter),
        });

        // MENTIONSOFTYPE
        self.register(FunctionDef {
            name: "MENTIONSOFTYPE",
            category: Category::Aggregate,
            params: &[Param {
                name: "entity_type",
                ty: ParamType::Text,
                required: true,
                description: "Entity type to select, e.g. \"person\"",
            }],
            variadic: false,
            description: "Names of mentioned entities of a given type",
            implementation: FunctionImpl::Sync(aggregate::fn_mentionsoftype),
        });
    }

    fn register_contextual_functions(&mut self) {
        // GET
        self.register(FunctionDef {
            name: "GET",
            category: Category::Contextual,
            params: &[Param {
                name: "field",
                ty: ParamType::Text,
                required: true,
                description: "Field name to read from the document",
            }],
            variadic: false,
            description: "Read a document field (null when absent)",
            implementation: FunctionImpl::Sync(contextual::fn_get),
        });

        // MENTION
        self.register(FunctionDef {
            name: "MENTION",
            category: Category::Contextual,
            params: &[Param {
                name: "name",
                ty: ParamType::Text,
                required: true,
                description: "Display name of the mentioned entity",
            }],
            variadic: false,
            description: "Resolve a mentioned entity by name",
            implementation: FunctionImpl::Sync(contextual::fn_mention),
        });

        // WEATHER (external I/O)
        self.register(FunctionDef {
            name: "WEATHER",
            category: Category::Contextual,
            params: &[Param {
                name: "location",
                ty: ParamType::Text,
                required: true,
                description: "Location to query",
            }],
            variadic: false,
            description: "Current weather for a location (external service)",
            implementation: FunctionImpl::Async(contextual::fn_weather),
        });

        // DISTANCE (external I/O)
        self.register(FunctionDef {
            name: "DISTANCE",
            category: Category::Contextual,
            params: CONTEXTUAL_ROUTE_PARAMS,
            variadic: false,
            description: "Distance between two locations (external service)",
            implementation: FunctionImpl::Async(contextual::fn_distance),
        });

        // ROUTE (external I/O)
        self.register(FunctionDef {
            name: "ROUTE",
            category: Category::Contextual,
            params: CONTEXTUAL_ROUTE_PARAMS,
            variadic: false,
            description: "Route summary between two locations (external service)",
            implementation: FunctionImpl::Async(contextual::fn_route),
        });
    }
}

const COMPARE_PARAMS: &[Param] = &[
    Param {
        name: "left",
        ty: ParamType::Any,
        required: true,
        description: "Left operand",
    },
    Param {
        name: "right",
        ty: ParamType::Any,
        required: true,
        description: "Right operand",
    },
];

const CONTEXTUAL_ROUTE_PARAMS: &[Param] = &[
    Param {
        name: "from",
        ty: ParamType::Text,
        required: true,
        description: "Origin",
    },
    Param {
        name: "to",
        ty: ParamType::Text,
        required: true,
        description: "Destination",
    },
];

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global function registry (built once, lives for the process lifetime)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// Shared registry accessor
pub fn registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Check whether a function name is in the catalog (case-insensitive)
pub fn has_function(name: &str) -> bool {
    registry().contains(name)
}

/// Expose the catalog to the host UI for discovery/autocomplete,
/// sorted by category then name
pub fn list_functions() -> Vec<FunctionInfo> {
    registry().catalog()
}

// === Argument coercion helpers shared by the implementations ===

pub(crate) fn number_arg(function: &str, args: &[Value], idx: usize) -> FormulaResult<f64> {
    let value = &args[idx];
    value.as_number().ok_or(FormulaError::Type {
        function: function.to_string(),
        arg: idx,
        expected: "number",
        actual: value.type_name(),
    })
}

pub(crate) fn text_arg<'v>(function: &str, args: &'v [Value], idx: usize) -> FormulaResult<&'v str> {
    match &args[idx] {
        Value::Text(s) => Ok(s),
        other => Err(FormulaError::Type {
            function: function.to_string(),
            arg: idx,
            expected: "text",
            actual: other.type_name(),
        }),
    }
}

pub(crate) fn bool_arg(function: &str, args: &[Value], idx: usize) -> FormulaResult<bool> {
    let value = &args[idx];
    value.as_bool().ok_or(FormulaError::Type {
        function: function.to_string(),
        arg: idx,
        expected: "boolean",
        actual: value.type_name(),
    })
}

pub(crate) fn datetime_arg(
    function: &str,
    args: &[Value],
    idx: usize,
) -> FormulaResult<chrono::DateTime<chrono::Utc>> {
    let value = &args[idx];
    value.as_datetime().ok_or(FormulaError::Type {
        function: function.to_string(),
        arg: idx,
        expected: "datetime",
        actual: value.type_name(),
    })
}

/// Flatten arguments into numbers: lists recurse, nulls are skipped, and
/// anything else must coerce to a number or the whole call is a type error
/// naming the offending argument.
pub(crate) fn collect_numbers(function: &str, args: &[Value]) -> FormulaResult<Vec<f64>> {
    fn push(function: &str, idx: usize, value: &Value, out: &mut Vec<f64>) -> FormulaResult<()> {
        match value {
            Value::Null => Ok(()),
            Value::List(items) => {
                for item in items {
                    push(function, idx, item, out)?;
                }
                Ok(())
            }
            other => {
                let n = other.as_number().ok_or(FormulaError::Type {
                    function: function.to_string(),
                    arg: idx,
                    expected: "number",
                    actual: other.type_name(),
                })?;
                out.push(n);
                Ok(())
            }
        }
    }

    let mut numbers = Vec::with_capacity(args.len());
    for (idx, value) in args.iter().enumerate() {
        push(function, idx, value, &mut numbers)?;
    }
    Ok(numbers)
}
