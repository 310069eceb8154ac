//! Asynchronous account verification pipeline
//!
//! Registration publishes a message to Kafka (key = email, payload = token);
//! the notification service consumes those messages and emails an activation
//! link; the auth service's `/verify` endpoint closes the loop by marking the
//! account verified. The pipeline decouples registration latency from mail
//! delivery: only the publish happens on the registration request path.

pub mod consumer;
pub mod mailer;
pub mod producer;

pub use consumer::{build_consumer, run_mail_loop};
pub use mailer::{MailError, Mailer};
pub use producer::{PublishError, VerificationProducer};
