// Pipeline steps grouped under one namespace
pub mod risk {
    pub use crate::risk::*;
}

pub mod normalize {
    pub use crate::normalize::*;
}

pub mod validation {
    pub use crate::validation::*;
}
