mod traits;
mod openai;

pub use traits::*;
pub use openai::OpenAiCompatClient;
