//! Declared field schemas and their validation
//!
//! A [`Schema`] describes a record of named, typed fields. It serves two roles:
//! - the parameter schema a tool advertises to the provider
//! - the shape a structured answer must conform to
//!
//! ```
//! use toolrelay_core::structured::{Field, Schema, SchemaValidator};
//! use serde_json::json;
//!
//! let schema = Schema::new("ContactInfo")
//!     .field(Field::string("name", "The name of the person"))
//!     .field(Field::string("email", "The email address of the person"));
//!
//! let payload = json!({"name": "John Doe", "email": "john@example.com"});
//! assert!(SchemaValidator::strict(&schema).validate(&payload).is_ok());
//! ```

mod schema;
mod validator;

pub use schema::{Field, FieldType, Schema};
pub use validator::{parse_payload, SchemaValidator, ValidationError};
