mod command_input;
mod guid_form;
mod input;
mod key_result;

pub use command_input::{CommandEvent, CommandInput};
pub use guid_form::GuidForm;
pub use key_result::KeyResult;
