#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SyscallError {
    #[error("{0} is full")]
    Full(&'static str),

    #[error("{0} is empty")]
    Empty(&'static str),

    #[error("no system call {0}")]
    NoSuchCall(i64),

    #[error("system call {0} needs an argument")]
    MissingArgument(i64),
}
