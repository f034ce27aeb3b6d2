use thiserror::Error;
use xdep_xpath1::XPathError;

#[derive(Error, Debug, Clone)]
pub enum DependencyError {
    #[error("failed to parse expression: {0}")]
    Parse(XPathError),

    #[error("evaluation failed: {0}")]
    Evaluation(XPathError),
}
