use thiserror::Error;

/// Errors raised when a structural mutation would break a graph invariant.
///
/// These are rejected synchronously; the graph snapshot is left unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("Node '{0}' cannot connect to itself")]
    SelfReference(String),

    #[error("The Start node cannot be the target of a connection")]
    IntoStart,

    #[error("The End node cannot be the source of a connection")]
    OutOfEnd,

    #[error("Path node '{0}' already has two branches")]
    BranchLimit(String),

    #[error("Node '{0}' already has an outgoing connection")]
    OutputOccupied(String),

    // Named `from`/`to` because thiserror reserves a `source` field for
    // the error-source chain.
    #[error("Connecting '{from}' to '{to}' would create a cycle")]
    CycleDetected { from: String, to: String },

    #[error("Node '{0}' does not exist in the graph")]
    NodeNotFound(String),

    #[error("Edge '{0}' does not exist in the graph")]
    EdgeNotFound(String),

    #[error("A node with id '{0}' already exists")]
    DuplicateNode(String),

    #[error("The Start and End nodes cannot be removed")]
    ProtectedNode,
}

/// A single per-node configuration failure, reported at save time.
///
/// Each variant names the offending node so the message can be surfaced
/// directly to the user. Validation is fail-fast: the first error halts
/// the save.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Node '{node}' has a configuration that does not match its action type")]
    MismatchedConfig { node: String },

    #[error("Node '{node}' has no object selected")]
    MissingObject { node: String },

    #[error("Node '{node}' needs at least one complete field mapping")]
    NoFieldMappings { node: String },

    #[error("Node '{node}' does not map the required field '{field}'")]
    UnmappedRequiredField { node: String, field: String },

    #[error("Node '{node}' needs at least one complete condition")]
    MissingConditions { node: String },

    #[error("Node '{node}' needs a logic type to combine its conditions")]
    MissingLogicType { node: String },

    #[error("Node '{node}' has file upload enabled but no upload fields selected")]
    MissingUploadFields { node: String },

    #[error("Node '{node}' has a return limit of {limit}, which is outside 1-100")]
    ReturnLimitOutOfRange { node: String, limit: u32 },

    #[error("Node '{node}' does not reference a Find step to filter")]
    MissingFilterSource { node: String },

    #[error("Node '{node}' references '{source_node}', which is not a Find step")]
    InvalidFilterSource { node: String, source_node: String },

    #[error(
        "Node '{node}' has an invalid collection: the referenced Find step is not an ancestor of this loop"
    )]
    InvalidCollection { node: String },

    #[error("Node '{node}' needs an iteration variable name")]
    MissingIterationVariable { node: String },

    #[error("Node '{node}' has a max-iterations value that is not a positive integer")]
    InvalidMaxIterations { node: String },

    #[error("Node '{node}' has no input field selected")]
    MissingFormatterField { node: String },

    #[error("Node '{node}' has no formatter operation selected")]
    MissingFormatterOperation { node: String },

    #[error("Node '{node}' is missing options for the '{operation}' operation")]
    IncompleteFormatterOptions { node: String, operation: String },

    #[error("Node '{node}': field '{field}' cannot be used with the '{operation}' operation")]
    IncompatibleFormatterField {
        node: String,
        field: String,
        operation: String,
    },

    #[error("Node '{node}' has no spreadsheet or worksheet selected")]
    MissingSheet { node: String },

    #[error(
        "Node '{node}' has an invalid custom logic expression: {}",
        .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
    )]
    InvalidExpression {
        node: String,
        errors: Vec<ExpressionError>,
    },
}

/// A syntax error in a custom logic expression.
///
/// Validation collects every error it finds rather than stopping at the
/// first, so a single pass over the expression can surface all problems.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("The expression is empty")]
    Empty,

    #[error("'{0}' is not a valid token (expected a condition number, AND, OR, or brackets)")]
    InvalidToken(String),

    #[error("Condition reference {index} is out of range (there are {max} conditions)")]
    IndexOutOfRange { index: usize, max: usize },

    #[error("Two operators cannot appear next to each other")]
    AdjacentOperators,

    #[error("Brackets are not balanced")]
    UnbalancedParens,

    #[error("The expression cannot start with an operator")]
    LeadingOperator,

    #[error("The expression cannot end with an operator")]
    TrailingOperator,

    #[error("Malformed expression: {0}")]
    Malformed(String),
}

/// Errors raised while evaluating conditions against runtime form data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("Condition on field '{field}' uses BETWEEN but has no upper bound")]
    MissingRangeBound { field: String },

    #[error(
        "Invalid custom logic expression: {}",
        .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ")
    )]
    Expression(Vec<ExpressionError>),
}

/// Failures reported by the external gateways (metadata, token, save).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Errors surfaced by the save pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ConfigError),

    #[error("Authentication failed after refreshing the token: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not serialize the flow payload: {0}")]
    Payload(String),
}
