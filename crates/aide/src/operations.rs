//! The operations advertised to the model and the typed form of its calls
//!
//! [`OperationName`] is the closed set of function names. Every name has a
//! catalog entry ([`catalog`]) and a parsed form ([`Invocation`]); a name that
//! is added without both fails to compile.
use lazy_static::lazy_static;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

use crate::errors::{AgentError, AgentResult};
use crate::graph::adapter::EventDraft;
use crate::graph::types::{attendees_from_value, TaskStatusFilter};
use crate::models::tool::{FunctionCall, Tool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, AsRefStr, Display)]
#[strum(serialize_all = "camelCase")]
pub enum OperationName {
    GetMyDetails,
    GetMyEvents,
    CreateCalendarEvent,
    GetMyTasks,
    GetMyTodoTaskList,
    CreateTodoTaskList,
    GetListTasks,
    CreateTodoTask,
    GetMyDriveDocuments,
    SendEmail,
    GetContactByName,
    ShowFunnyMessage,
}

impl OperationName {
    pub fn description(&self) -> &'static str {
        match self {
            OperationName::GetMyDetails => "Get the details of the current user",
            OperationName::GetMyEvents => {
                "Get the events in a calendar of the current user. Show information in an ordered list."
            }
            OperationName::CreateCalendarEvent => {
                "Create an event in a calendar of the current user. Contact information is required, \
                 use function getContactByName to get it. Build the attendees with the result of \
                 getContactByName in the format: attendees: [{ emailAddress: { address: 'emailAddress', \
                 name: 'name' }, type: 'required' }]"
            }
            OperationName::GetMyTasks => "Get the Planner tasks assigned to the current user",
            OperationName::GetMyTodoTaskList => {
                "Get the todo task lists from the Microsoft To Do of the current user. To show the \
                 tasks of a list use the function getListTasks. To create a task use the function \
                 createTodoTask."
            }
            OperationName::CreateTodoTaskList => {
                "Create a todo task list in the Microsoft To Do of the current user. Only use this \
                 function for a list of tasks."
            }
            OperationName::GetListTasks => {
                "Get the completed or not completed tasks of a todo task list in the Microsoft To Do \
                 of the current user. Use function getMyTodoTaskList to get the id of the list."
            }
            OperationName::CreateTodoTask => {
                "Create a task in a task list of the Microsoft To Do of the current user. Always use \
                 function getMyTodoTaskList to get the id of the list first."
            }
            OperationName::GetMyDriveDocuments => {
                "Get the documents from the OneDrive of the current user"
            }
            OperationName::SendEmail => "Send an email to a recipient",
            OperationName::GetContactByName => "Get the details of a contact by name",
            OperationName::ShowFunnyMessage => {
                "If the user's query is not related to work based personal assistance then show a \
                 funny message"
            }
        }
    }

    /// JSON schema of the arguments
    pub fn parameters(&self) -> Value {
        match self {
            OperationName::GetMyDetails => object_schema(
                json!({
                    "getNameOnly": {"type": "boolean", "description": "Get user's name only"}
                }),
                &["getNameOnly"],
            ),
            OperationName::GetMyEvents => object_schema(
                json!({
                    "getFutureEventsOnly": {"type": "boolean", "description": "Get future events only"}
                }),
                &["getFutureEventsOnly"],
            ),
            OperationName::CreateCalendarEvent => object_schema(
                json!({
                    "subject": {"type": "string", "description": "Subject of the event"},
                    "attendees": {
                        "type": "object",
                        "description": "Attendees of the event. Each attendee is an object with emailAddress and type properties. emailAddress is an object with address and name properties. type is a string. Use function getContactByName to get the emailAddress of a contact."
                    },
                    "startDateTime": {
                        "type": "string",
                        "description": "Start date and time of the event, taken from the user's query. Format: YYYY-MM-DDTHH:MM:SS"
                    },
                    "endDateTime": {
                        "type": "string",
                        "description": "End date and time of the event, taken from the user's query. Format: YYYY-MM-DDTHH:MM:SS"
                    },
                    "location": {"type": "string", "description": "Location of the event"}
                }),
                &["subject", "attendees", "startDateTime", "endDateTime", "location"],
            ),
            OperationName::GetMyTasks => object_schema(
                json!({
                    "getIncompleteTasksOnly": {"type": "boolean", "description": "Get incomplete tasks only"}
                }),
                &["getIncompleteTasksOnly"],
            ),
            OperationName::GetMyTodoTaskList | OperationName::GetMyDriveDocuments => {
                object_schema(json!({}), &[])
            }
            OperationName::CreateTodoTaskList => object_schema(
                json!({
                    "displayName": {
                        "type": "string",
                        "description": "Name of the todo task list. Send the name with the first word capitalized."
                    }
                }),
                &["displayName"],
            ),
            OperationName::GetListTasks => object_schema(
                json!({
                    "getTasksByStatus": {
                        "type": "string",
                        "description": "Identify if the query is to get incomplete tasks, completed tasks or all tasks"
                    },
                    "idTodoList": {
                        "type": "string",
                        "description": "Id of the todo task list, taken from the result of the function getMyTodoTaskList."
                    }
                }),
                &["getTasksByStatus", "idTodoList"],
            ),
            OperationName::CreateTodoTask => object_schema(
                json!({
                    "title": {
                        "type": "string",
                        "description": "Title of the task. Send the name with the first word capitalized."
                    },
                    "idTodoList": {
                        "type": "string",
                        "description": "Id of the todo task list, taken from the result of the function getMyTodoTaskList."
                    }
                }),
                &["title", "idTodoList"],
            ),
            OperationName::SendEmail => object_schema(
                json!({
                    "to": {"type": "string", "description": "Email address of the recipient"},
                    "subject": {"type": "string", "description": "Subject of the email"},
                    "body": {"type": "string", "description": "Body of the email"}
                }),
                &["to", "subject", "body"],
            ),
            OperationName::GetContactByName => object_schema(
                json!({
                    "name": {"type": "string", "description": "Name of the contact"}
                }),
                &["name"],
            ),
            OperationName::ShowFunnyMessage => object_schema(
                json!({
                    "funnyMessage": {
                        "type": "string",
                        "description": "A funny or sarcastic message saying why the user's query is not related to work based personal assistance. Max 20 words."
                    }
                }),
                &["funnyMessage"],
            ),
        }
    }

    pub fn tool(&self) -> Tool {
        Tool::new(self.as_ref(), self.description(), self.parameters())
    }
}

fn object_schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

lazy_static! {
    static ref CATALOG: Vec<Tool> = OperationName::iter().map(|name| name.tool()).collect();
}

/// Every function the model may call, built once per process
pub fn catalog() -> &'static [Tool] {
    &CATALOG
}

/// A Graph operation requested by the model, with typed arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    GetMyDetails { name_only: bool },
    GetMyEvents { future_only: bool },
    CreateCalendarEvent(EventDraft),
    GetMyTasks { incomplete_only: bool },
    GetMyTodoTaskList,
    CreateTodoTaskList { display_name: String },
    GetListTasks { filter: TaskStatusFilter, list_id: String },
    CreateTodoTask { title: String, list_id: String },
    GetMyDriveDocuments,
    SendEmail { to: String, subject: String, body: String },
    GetContactByName { name: String },
}

impl Operation {
    pub fn name(&self) -> OperationName {
        match self {
            Operation::GetMyDetails { .. } => OperationName::GetMyDetails,
            Operation::GetMyEvents { .. } => OperationName::GetMyEvents,
            Operation::CreateCalendarEvent(_) => OperationName::CreateCalendarEvent,
            Operation::GetMyTasks { .. } => OperationName::GetMyTasks,
            Operation::GetMyTodoTaskList => OperationName::GetMyTodoTaskList,
            Operation::CreateTodoTaskList { .. } => OperationName::CreateTodoTaskList,
            Operation::GetListTasks { .. } => OperationName::GetListTasks,
            Operation::CreateTodoTask { .. } => OperationName::CreateTodoTask,
            Operation::GetMyDriveDocuments => OperationName::GetMyDriveDocuments,
            Operation::SendEmail { .. } => OperationName::SendEmail,
            Operation::GetContactByName { .. } => OperationName::GetContactByName,
        }
    }
}

/// What a function call asks the assistant to do
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Execute(Operation),
    /// The query is out of scope; carries the model's message for the user
    Unsupported(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetMyDetailsArgs {
    #[serde(default)]
    get_name_only: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetMyEventsArgs {
    #[serde(default)]
    get_future_events_only: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCalendarEventArgs {
    subject: String,
    #[serde(default)]
    attendees: Value,
    start_date_time: String,
    end_date_time: String,
    #[serde(default)]
    location: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetMyTasksArgs {
    #[serde(default)]
    get_incomplete_tasks_only: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTodoTaskListArgs {
    display_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetListTasksArgs {
    #[serde(default)]
    get_tasks_by_status: String,
    id_todo_list: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTodoTaskArgs {
    title: String,
    id_todo_list: String,
}

#[derive(Deserialize)]
struct SendEmailArgs {
    to: String,
    subject: String,
    body: String,
}

#[derive(Deserialize)]
struct GetContactByNameArgs {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShowFunnyMessageArgs {
    funny_message: String,
}

fn arguments<T: DeserializeOwned>(call: &FunctionCall) -> AgentResult<T> {
    serde_json::from_value(call.arguments.clone()).map_err(|e| {
        AgentError::InvalidArguments(format!("Could not interpret arguments for {}: {}", call.name, e))
    })
}

impl Invocation {
    /// Resolve a function call against the catalog
    pub fn parse(call: &FunctionCall) -> AgentResult<Invocation> {
        let name = OperationName::from_str(&call.name)
            .map_err(|_| AgentError::FunctionNotFound(call.name.clone()))?;

        let operation = match name {
            OperationName::GetMyDetails => {
                let args: GetMyDetailsArgs = arguments(call)?;
                Operation::GetMyDetails {
                    name_only: args.get_name_only,
                }
            }
            OperationName::GetMyEvents => {
                let args: GetMyEventsArgs = arguments(call)?;
                Operation::GetMyEvents {
                    future_only: args.get_future_events_only,
                }
            }
            OperationName::CreateCalendarEvent => {
                let args: CreateCalendarEventArgs = arguments(call)?;
                let attendees = attendees_from_value(&args.attendees).map_err(|e| {
                    AgentError::InvalidArguments(format!("Could not interpret attendees: {}", e))
                })?;
                Operation::CreateCalendarEvent(EventDraft {
                    subject: args.subject,
                    attendees,
                    start: args.start_date_time,
                    end: args.end_date_time,
                    location: args.location,
                })
            }
            OperationName::GetMyTasks => {
                let args: GetMyTasksArgs = arguments(call)?;
                Operation::GetMyTasks {
                    incomplete_only: args.get_incomplete_tasks_only,
                }
            }
            OperationName::GetMyTodoTaskList => Operation::GetMyTodoTaskList,
            OperationName::CreateTodoTaskList => {
                let args: CreateTodoTaskListArgs = arguments(call)?;
                Operation::CreateTodoTaskList {
                    display_name: args.display_name,
                }
            }
            OperationName::GetListTasks => {
                let args: GetListTasksArgs = arguments(call)?;
                Operation::GetListTasks {
                    filter: TaskStatusFilter::from_model(&args.get_tasks_by_status),
                    list_id: args.id_todo_list,
                }
            }
            OperationName::CreateTodoTask => {
                let args: CreateTodoTaskArgs = arguments(call)?;
                Operation::CreateTodoTask {
                    title: args.title,
                    list_id: args.id_todo_list,
                }
            }
            OperationName::GetMyDriveDocuments => Operation::GetMyDriveDocuments,
            OperationName::SendEmail => {
                let args: SendEmailArgs = arguments(call)?;
                Operation::SendEmail {
                    to: args.to,
                    subject: args.subject,
                    body: args.body,
                }
            }
            OperationName::GetContactByName => {
                let args: GetContactByNameArgs = arguments(call)?;
                Operation::GetContactByName { name: args.name }
            }
            OperationName::ShowFunnyMessage => {
                let args: ShowFunnyMessageArgs = arguments(call)?;
                return Ok(Invocation::Unsupported(args.funny_message));
            }
        };

        Ok(Invocation::Execute(operation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_lists_every_operation_once() {
        let names: Vec<&str> = catalog().iter().map(|tool| tool.name.as_str()).collect();
        assert_eq!(names.len(), 12);
        assert_eq!(names.iter().collect::<HashSet<_>>().len(), names.len());
        assert!(names.contains(&"getMyTodoTaskList"));
        assert!(names.contains(&"showFunnyMessage"));
    }

    #[test]
    fn test_catalog_schemas_are_objects() {
        for tool in catalog() {
            assert_eq!(tool.parameters["type"], "object", "{}", tool.name);
            assert!(tool.parameters["required"].is_array(), "{}", tool.name);
            assert!(!tool.description.is_empty());
        }
    }

    #[test]
    fn test_name_round_trips_through_strum() {
        for name in OperationName::iter() {
            assert_eq!(OperationName::from_str(name.as_ref()).unwrap(), name);
        }
        assert_eq!(OperationName::GetMyDriveDocuments.to_string(), "getMyDriveDocuments");
    }

    #[test]
    fn test_parse_unknown_name() {
        let call = FunctionCall::new("deleteEverything", json!({}));
        assert_eq!(
            Invocation::parse(&call),
            Err(AgentError::FunctionNotFound("deleteEverything".to_string()))
        );
    }

    #[test]
    fn test_parse_get_my_details() {
        let call = FunctionCall::new("getMyDetails", json!({"getNameOnly": true}));
        assert_eq!(
            Invocation::parse(&call).unwrap(),
            Invocation::Execute(Operation::GetMyDetails { name_only: true })
        );
    }

    #[test]
    fn test_parse_operation_without_arguments() {
        let call = FunctionCall::new("getMyDriveDocuments", json!({}));
        assert_eq!(
            Invocation::parse(&call).unwrap(),
            Invocation::Execute(Operation::GetMyDriveDocuments)
        );
    }

    #[test]
    fn test_parse_get_list_tasks() {
        let call = FunctionCall::new(
            "getListTasks",
            json!({"getTasksByStatus": "not completed", "idTodoList": "AAMk"}),
        );
        let invocation = Invocation::parse(&call).unwrap();
        assert_eq!(
            invocation,
            Invocation::Execute(Operation::GetListTasks {
                filter: TaskStatusFilter::Incomplete,
                list_id: "AAMk".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_create_calendar_event_wrapped_attendees() {
        let call = FunctionCall::new(
            "createCalendarEvent",
            json!({
                "subject": "Planning",
                "attendees": {"attendees": [{"emailAddress": {"address": "bo@contoso.com", "name": "Bo"}, "type": "required"}]},
                "startDateTime": "2024-03-02T10:00:00",
                "endDateTime": "2024-03-02T11:00:00",
                "location": "Teams"
            }),
        );

        let Invocation::Execute(Operation::CreateCalendarEvent(draft)) =
            Invocation::parse(&call).unwrap()
        else {
            panic!("Expected a calendar event");
        };
        assert_eq!(draft.subject, "Planning");
        assert_eq!(draft.attendees.len(), 1);
        assert_eq!(draft.location, "Teams");
    }

    #[test]
    fn test_parse_missing_required_argument() {
        let call = FunctionCall::new("sendEmail", json!({"to": "bo@contoso.com"}));
        match Invocation::parse(&call) {
            Err(AgentError::InvalidArguments(msg)) => assert!(msg.contains("sendEmail")),
            other => panic!("Expected invalid arguments, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_funny_message() {
        let call = FunctionCall::new(
            "showFunnyMessage",
            json!({"funnyMessage": "I only juggle meetings, not pizzas."}),
        );
        assert_eq!(
            Invocation::parse(&call).unwrap(),
            Invocation::Unsupported("I only juggle meetings, not pizzas.".to_string())
        );
    }
}
