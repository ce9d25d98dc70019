use crate::error::AppError;
use crate::registry::{CommandData, CommandOutput};
use crate::store::DocumentStore;

pub fn undo(store: &mut DocumentStore) -> Result<CommandOutput, AppError> {
    let message = if store.undo() { "Undone." } else { "Nothing to undo." };
    Ok(CommandOutput::data(message, CommandData::History(store.undo_state())))
}

pub fn redo(store: &mut DocumentStore) -> Result<CommandOutput, AppError> {
    let message = if store.redo() { "Redone." } else { "Nothing to redo." };
    Ok(CommandOutput::data(message, CommandData::History(store.undo_state())))
}
