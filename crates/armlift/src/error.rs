use thiserror::Error;

/// Lifter front-end errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex instruction `{0}`")]
    InvalidHex(String),
    #[error("no code to lift")]
    EmptyCode,
    #[error("code length {len} is not a multiple of {unit}")]
    OddLength { len: usize, unit: usize },
    #[error("address 0x{pc:x} is outside the code buffer")]
    OutOfBuffer { pc: u32 },
    #[error("cannot decode instruction at 0x{pc:x}")]
    Decode { pc: u32 },
    #[error("invalid register assignment `{0}`")]
    InvalidRegister(String),
    #[error("flags thunk holds unknown operation {0}")]
    BadFlagsThunk(u32),
    #[error("interpreter error: {0}")]
    Interp(#[from] armlift_ir::InterpError),
}

pub type Result<T> = std::result::Result<T, Error>;
