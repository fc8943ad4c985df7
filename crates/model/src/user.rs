use schemars::JsonSchema;
use utility::id::HasId;

/// The owner of stored routes. Accounts live in an external identity service,
/// only their id is known here.
#[derive(Debug, Clone, JsonSchema)]
pub struct User;

impl HasId for User {
    type IdType = String;
}
