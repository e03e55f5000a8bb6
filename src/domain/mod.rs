pub mod highlight;
pub mod model;
pub mod permission;
pub mod schema;
