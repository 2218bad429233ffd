mod users;

pub use users::{cmd_set_role, cmd_set_status};
