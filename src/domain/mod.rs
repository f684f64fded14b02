mod action;
mod check_interval;
mod commit;
mod project;
mod repository_url;
mod secret_name;

pub use action::*;
pub use check_interval::*;
pub use commit::*;
pub use project::*;
pub use repository_url::*;
pub use secret_name::*;
