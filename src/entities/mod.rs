//! SeaORM entity definitions
//!
//! One module per table. Domain models live in `crate::models`; these types
//! only describe the relational layout and the relations used for joins.

pub mod prelude;

pub mod forums;
pub mod groups;
pub mod posts;
pub mod role_values;
pub mod roles;
pub mod topics;
pub mod user_groups;
pub mod users;
