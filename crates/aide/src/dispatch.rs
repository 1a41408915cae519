use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AgentResult;
use crate::graph::adapter::to_function_result;
use crate::graph::GraphAdapter;
use crate::operations::Operation;

/// How the final answer of a turn is shown to the user
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Presentation {
    #[default]
    Text,
    ProfileCard { picture_url: Option<String> },
}

/// The result of one executed operation
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionOutput {
    /// Handed back to the model, `null` when nothing was found
    pub result: Value,
    pub presentation: Presentation,
}

impl FunctionOutput {
    pub fn new(result: Value) -> Self {
        Self {
            result,
            presentation: Presentation::Text,
        }
    }

    pub fn with_presentation(mut self, presentation: Presentation) -> Self {
        self.presentation = presentation;
        self
    }
}

/// Executes the operations the model asks for
#[async_trait]
pub trait Toolbox: Send + Sync {
    async fn call(&self, operation: &Operation) -> AgentResult<FunctionOutput>;
}

#[async_trait]
impl Toolbox for GraphAdapter {
    async fn call(&self, operation: &Operation) -> AgentResult<FunctionOutput> {
        tracing::info!(operation = %operation.name(), "calling microsoft graph");

        let result = match operation {
            Operation::GetMyDetails { name_only } => {
                let details = to_function_result(self.get_my_details(*name_only).await?)?;
                if !*name_only {
                    return Ok(FunctionOutput::new(details));
                }

                // The name is shown on a profile card, a missing photo only drops the picture
                let picture_url = match self.get_my_photo().await {
                    Ok(picture_url) => picture_url,
                    Err(e) => {
                        tracing::warn!(error = %e, "could not load profile photo");
                        None
                    }
                };
                return Ok(FunctionOutput::new(details)
                    .with_presentation(Presentation::ProfileCard { picture_url }));
            }
            Operation::GetMyEvents { future_only } => {
                to_function_result(self.get_my_events(*future_only).await?)?
            }
            Operation::CreateCalendarEvent(draft) => {
                to_function_result(self.create_calendar_event(draft.clone()).await?)?
            }
            Operation::GetMyTasks { incomplete_only } => {
                to_function_result(self.get_my_tasks(*incomplete_only).await?)?
            }
            Operation::GetMyTodoTaskList => to_function_result(self.get_todo_task_lists().await?)?,
            Operation::CreateTodoTaskList { display_name } => {
                to_function_result(self.create_todo_task_list(display_name).await?)?
            }
            Operation::GetListTasks { filter, list_id } => {
                to_function_result(self.get_list_tasks(*filter, list_id).await?)?
            }
            Operation::CreateTodoTask { title, list_id } => {
                to_function_result(self.create_todo_task(title, list_id).await?)?
            }
            Operation::GetMyDriveDocuments => {
                to_function_result(self.get_my_drive_documents().await?)?
            }
            Operation::SendEmail { to, subject, body } => {
                to_function_result(self.send_email(to, subject, body).await?)?
            }
            Operation::GetContactByName { name } => {
                to_function_result(self.get_contact_by_name(name).await?)?
            }
        };

        Ok(FunctionOutput::new(result))
    }
}
