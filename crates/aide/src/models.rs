//! These models represent the objects passed around during a turn
//!
//! There are a few related formats we need to interact with:
//! - bot framework activities, received from Teams and sent back to it
//! - openai messages/functions, sent from the agent to the LLM
//! - graph resources, fetched on behalf of the user and handed back to the LLM
//!
//! Incoming formats are converted into these internal structs as soon as they
//! arrive, the wire formats only exist at the edges.
pub mod message;
pub mod role;
pub mod tool;
pub mod transcript;
