use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("recomposition did not settle after {passes} passes")]
    RecompositionLimit { passes: usize },
}
