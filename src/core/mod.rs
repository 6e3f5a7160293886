// Domain-layer modules and shared errors/models
pub mod reconciler {
    pub use crate::reconciler::*;
}

pub mod precedence {
    pub use crate::precedence::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
