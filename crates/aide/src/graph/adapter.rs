use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use super::client::{DelegatedCredential, GraphClient};
use super::types::{
    Attendee, Contact, DateTimeTimeZone, DriveItem, EmailAddress, Event, GraphCollection, ItemBody,
    Location, MailMessage, NewEvent, PlannerTask, Profile, Recipient, SendMail, TaskStatusFilter,
    TodoTask, TodoTaskList, User,
};
use crate::errors::GraphResult;

pub const EMAIL_SENT: &str = "Email sent successfully";
const DEFAULT_PHOTO_TYPE: &str = "image/png";
/// Event reads always request UTC wall-clock times; the configured zone
/// applies only to created events.
const READ_TIME_ZONE: &str = "outlook.timezone=\"UTC\"";

const USER_FIELDS: &str = "displayName,givenName,surname,mail,userPrincipalName,jobTitle,officeLocation,mobilePhone,businessPhones,preferredLanguage";
const EVENT_FIELDS: &str = "subject,start,end,attendees,location";
const PLANNER_FIELDS: &str = "title,startDateTime,dueDateTime,percentComplete";
const TODO_LIST_FIELDS: &str = "id,displayName,wellknownListName";
const TODO_TASK_FIELDS: &str = "id,title,status,importance,dueDateTime,createdDateTime";
const DRIVE_FIELDS: &str = "name,webUrl,@microsoft.graph.downloadUrl,createdBy,lastModifiedBy";
const CONTACT_FIELDS: &str =
    "displayName,emailAddresses,companyName,jobTitle,mobilePhone,businessPhones";

/// Details of a new calendar event as the model describes it
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub subject: String,
    pub attendees: Vec<Attendee>,
    pub start: String,
    pub end: String,
    pub location: String,
}

/// The productivity operations of one turn, bound to the user's credential
pub struct GraphAdapter {
    client: GraphClient,
    time_zone: String,
}

impl GraphAdapter {
    pub fn new(client: GraphClient, time_zone: impl Into<String>) -> Self {
        Self {
            client,
            time_zone: time_zone.into(),
        }
    }

    pub fn connect(
        endpoint: &str,
        credential: DelegatedCredential,
        time_zone: impl Into<String>,
    ) -> GraphResult<Self> {
        Ok(Self::new(GraphClient::new(endpoint, credential)?, time_zone))
    }

    fn select(fields: &str) -> [(&'static str, String); 1] {
        [("$select", fields.to_string())]
    }

    pub async fn get_my_details(&self, name_only: bool) -> GraphResult<Option<Profile>> {
        let url = self.client.url_with_segments(&["me"])?;
        let user: Option<User> = self
            .client
            .get_json(url, &Self::select(USER_FIELDS), &[])
            .await?;

        Ok(user.map(|user| match (name_only, user.display_name.clone()) {
            (true, Some(name)) => Profile::Name(name),
            _ => Profile::Full(user),
        }))
    }

    /// The profile photo as a data URI
    pub async fn get_my_photo(&self) -> GraphResult<Option<String>> {
        let url = self.client.url_with_segments(&["me", "photo", "$value"])?;
        let Some(photo) = self.client.get_bytes(url).await? else {
            return Ok(None);
        };

        let content_type = photo
            .content_type
            .as_deref()
            .filter(|value| value.starts_with("image/"))
            .unwrap_or(DEFAULT_PHOTO_TYPE);

        Ok(Some(format!(
            "data:{};base64,{}",
            content_type,
            STANDARD.encode(&photo.bytes)
        )))
    }

    pub async fn get_my_events(&self, future_only: bool) -> GraphResult<Option<Vec<Event>>> {
        self.get_my_events_at(future_only, Utc::now()).await
    }

    pub async fn get_my_events_at(
        &self,
        future_only: bool,
        now: DateTime<Utc>,
    ) -> GraphResult<Option<Vec<Event>>> {
        let url = self.client.url_with_segments(&["me", "events"])?;
        let events: Option<GraphCollection<Event>> = self
            .client
            .get_json(url, &Self::select(EVENT_FIELDS), &[("Prefer", READ_TIME_ZONE)])
            .await?;

        Ok(events.map(|events| {
            if future_only {
                upcoming_events(events.value, now)
            } else {
                events.value
            }
        }))
    }

    pub async fn create_calendar_event(&self, draft: EventDraft) -> GraphResult<Option<Event>> {
        let url = self.client.url_with_segments(&["me", "events"])?;
        let body = NewEvent {
            subject: draft.subject,
            attendees: draft.attendees,
            start: DateTimeTimeZone::new(draft.start, self.time_zone.as_str()),
            end: DateTimeTimeZone::new(draft.end, self.time_zone.as_str()),
            location: Location {
                display_name: Some(draft.location),
            },
        };

        self.client.post_json(url, &body).await
    }

    pub async fn get_my_tasks(&self, incomplete_only: bool) -> GraphResult<Option<Vec<PlannerTask>>> {
        let url = self.client.url_with_segments(&["me", "planner", "tasks"])?;
        let tasks: Option<GraphCollection<PlannerTask>> = self
            .client
            .get_json(url, &Self::select(PLANNER_FIELDS), &[])
            .await?;

        Ok(tasks.map(|tasks| {
            if incomplete_only {
                incomplete_planner_tasks(tasks.value)
            } else {
                tasks.value
            }
        }))
    }

    pub async fn get_todo_task_lists(&self) -> GraphResult<Option<Vec<TodoTaskList>>> {
        let url = self.client.url_with_segments(&["me", "todo", "lists"])?;
        let lists: Option<GraphCollection<TodoTaskList>> = self
            .client
            .get_json(url, &Self::select(TODO_LIST_FIELDS), &[])
            .await?;
        Ok(lists.map(|lists| lists.value))
    }

    pub async fn create_todo_task_list(&self, name: &str) -> GraphResult<Option<TodoTaskList>> {
        let url = self.client.url_with_segments(&["me", "todo", "lists"])?;
        self.client
            .post_json(url, &json!({ "displayName": name }))
            .await
    }

    pub async fn get_list_tasks(
        &self,
        filter: TaskStatusFilter,
        list_id: &str,
    ) -> GraphResult<Option<Vec<TodoTask>>> {
        let url = self
            .client
            .url_with_segments(&["me", "todo", "lists", list_id, "tasks"])?;
        let tasks: Option<GraphCollection<TodoTask>> = self
            .client
            .get_json(url, &Self::select(TODO_TASK_FIELDS), &[])
            .await?;
        Ok(tasks.map(|tasks| filter_todo_tasks(tasks.value, filter)))
    }

    pub async fn create_todo_task(
        &self,
        title: &str,
        list_id: &str,
    ) -> GraphResult<Option<TodoTask>> {
        let url = self
            .client
            .url_with_segments(&["me", "todo", "lists", list_id, "tasks"])?;
        self.client.post_json(url, &json!({ "title": title })).await
    }

    pub async fn get_my_drive_documents(&self) -> GraphResult<Option<Vec<DriveItem>>> {
        let url = self
            .client
            .url_with_segments(&["me", "drive", "root", "children"])?;
        let items: Option<GraphCollection<DriveItem>> = self
            .client
            .get_json(url, &Self::select(DRIVE_FIELDS), &[])
            .await?;
        Ok(items.map(|items| items.value))
    }

    /// Send a plain text mail. Graph answers `202 Accepted` without a body.
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> GraphResult<Option<String>> {
        let url = self.client.url_with_segments(&["me", "sendMail"])?;
        let mail = SendMail {
            message: MailMessage {
                subject: subject.to_string(),
                to_recipients: vec![Recipient {
                    email_address: EmailAddress {
                        address: Some(to.to_string()),
                        name: None,
                    },
                }],
                body: ItemBody {
                    content: body.to_string(),
                    content_type: "text".to_string(),
                },
            },
        };

        let status = self.client.post_action(url, &mail).await?;
        if status.is_success() {
            Ok(Some(EMAIL_SENT.to_string()))
        } else {
            tracing::warn!(%status, "sendMail did not succeed");
            Ok(None)
        }
    }

    pub async fn get_contact_by_name(&self, name: &str) -> GraphResult<Option<Vec<Contact>>> {
        let url = self.client.url_with_segments(&["me", "contacts"])?;
        let query = [
            ("$filter", contact_filter(name)),
            ("$select", CONTACT_FIELDS.to_string()),
        ];
        let contacts: Option<GraphCollection<Contact>> =
            self.client.get_json(url, &query, &[]).await?;

        Ok(contacts
            .map(|contacts| contacts.value)
            .filter(|contacts| !contacts.is_empty()))
    }
}

/// Events whose end is strictly after `now`. Events without a readable end are dropped.
pub fn upcoming_events(events: Vec<Event>, now: DateTime<Utc>) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| event.ends_after(now))
        .collect()
}

pub fn incomplete_planner_tasks(tasks: Vec<PlannerTask>) -> Vec<PlannerTask> {
    tasks.into_iter().filter(|task| !task.is_complete()).collect()
}

pub fn filter_todo_tasks(tasks: Vec<TodoTask>, filter: TaskStatusFilter) -> Vec<TodoTask> {
    tasks.into_iter().filter(|task| filter.accepts(task)).collect()
}

/// OData string literals escape a single quote by doubling it
pub fn contact_filter(name: &str) -> String {
    format!("startswith(displayName,'{}')", name.replace('\'', "''"))
}

/// Anything Graph hands back, flattened for the model
pub fn to_function_result<T: Serialize>(value: Option<T>) -> GraphResult<Value> {
    match value {
        Some(value) => Ok(serde_json::to_value(value)?),
        None => Ok(Value::Null),
    }
}
