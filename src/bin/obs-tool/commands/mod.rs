mod ls;
mod object;
mod sign;

pub use ls::execute_ls;
pub use object::{execute_exists, execute_get, execute_put, execute_rm};
pub use sign::execute_sign;
