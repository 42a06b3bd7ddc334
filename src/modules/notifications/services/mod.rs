pub mod notifier;

pub use notifier::{dispatch, LogNotifier, Notifier};
