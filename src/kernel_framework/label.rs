use std::{
    fmt::{Debug, Display},
    hash::Hash,
};

/// Anything that can serve as a symbolic state or action label.
pub trait Label: Hash + Clone + Eq + Display + Debug + Send + Sync {}

impl<T: Hash + Clone + Eq + Display + Debug + Send + Sync> Label for T {}
