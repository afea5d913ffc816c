mod flatten;
mod infer;
mod profile;
mod util;

pub use flatten::Flatten;
pub use infer::Infer;
pub use profile::Profile;
