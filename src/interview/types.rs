use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::InterviewError;

/// Id of the greeting shown before any topic is picked. Never persisted.
pub const WELCOME_MESSAGE_ID: &str = "welcome";

/// Interview subject areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    JavaCore,
    SpringBoot,
    Redis,
    Mysql,
    Mongo,
    Kafka,
    Elasticsearch,
    DistributedSystems,
    Algorithms,
    DesignPatterns,
    CodingAbility,
}

impl Topic {
    pub const ALL: [Topic; 11] = [
        Topic::JavaCore,
        Topic::SpringBoot,
        Topic::Redis,
        Topic::Mysql,
        Topic::Mongo,
        Topic::Kafka,
        Topic::Elasticsearch,
        Topic::DistributedSystems,
        Topic::Algorithms,
        Topic::DesignPatterns,
        Topic::CodingAbility,
    ];

    /// Identifier used on the wire and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            Topic::JavaCore => "JAVA_CORE",
            Topic::SpringBoot => "SPRING_BOOT",
            Topic::Redis => "REDIS",
            Topic::Mysql => "MYSQL",
            Topic::Mongo => "MONGO",
            Topic::Kafka => "KAFKA",
            Topic::Elasticsearch => "ELASTICSEARCH",
            Topic::DistributedSystems => "DISTRIBUTED_SYSTEMS",
            Topic::Algorithms => "ALGORITHMS",
            Topic::DesignPatterns => "DESIGN_PATTERNS",
            Topic::CodingAbility => "CODING_ABILITY",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Topic::JavaCore => "Java Core & Concurrency",
            Topic::SpringBoot => "Spring Boot & Frameworks",
            Topic::Redis => "Redis & Caching Strategies",
            Topic::Mysql => "MySQL & Tuning",
            Topic::Mongo => "MongoDB & NoSQL",
            Topic::Kafka => "Kafka & Message Queues",
            Topic::Elasticsearch => "Elasticsearch",
            Topic::DistributedSystems => "Distributed Systems Design",
            Topic::Algorithms => "Algorithms & Data Structures",
            Topic::DesignPatterns => "Design Patterns & Refactoring",
            Topic::CodingAbility => "Hands-on Coding",
        }
    }
}

impl Default for Topic {
    fn default() -> Self {
        Topic::JavaCore
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Topic {
    type Err = InterviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Topic::ALL
            .into_iter()
            .find(|t| t.id().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| InterviewError::UnknownTopic(s.to_string()))
    }
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sender {
    Ai,
    User,
}

/// How a message is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "TEXT")]
    PlainText,
    #[serde(rename = "EVALUATION")]
    Evaluation,
}

/// Scored review of one answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// 0 to 100
    pub score: u8,
    pub analysis: String,
    #[serde(default)]
    pub missing_points: Vec<String>,
    pub ideal_answer: String,
}

impl EvaluationResult {
    /// Build a result, clamping the raw score into 0..=100
    pub fn new(
        score: i64,
        analysis: impl Into<String>,
        missing_points: Vec<String>,
        ideal_answer: impl Into<String>,
    ) -> Self {
        Self {
            score: score.clamp(0, 100) as u8,
            analysis: analysis.into(),
            missing_points,
            ideal_answer: ideal_answer.into(),
        }
    }
}

/// One turn record in the message log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Sender,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Markdown
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationResult>,
    /// Epoch millis
    pub timestamp: i64,
}

impl Message {
    fn new(sender: Sender, kind: MessageKind, content: String) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            sender,
            kind,
            content,
            evaluation: None,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn user_text(content: impl Into<String>) -> Self {
        Self::new(Sender::User, MessageKind::PlainText, content.into())
    }

    pub fn ai_text(content: impl Into<String>) -> Self {
        Self::new(Sender::Ai, MessageKind::PlainText, content.into())
    }

    pub fn evaluation(result: EvaluationResult) -> Self {
        let mut msg = Self::new(
            Sender::Ai,
            MessageKind::Evaluation,
            "Here is my evaluation of your answer:".to_string(),
        );
        msg.evaluation = Some(result);
        msg
    }

    pub fn welcome() -> Self {
        let mut msg = Self::ai_text(
            "**Welcome to the senior backend interview simulator.**\n\n\
             I will act as your technical interviewer. Pick a topic to begin.\n\n\
             **Tip:** once I have evaluated an answer, ask about anything that is \
             still unclear and I will explain it.",
        );
        msg.id = WELCOME_MESSAGE_ID.to_string();
        msg
    }

    pub fn is_welcome(&self) -> bool {
        self.id == WELCOME_MESSAGE_ID
    }

    pub fn is_ai_text(&self) -> bool {
        self.sender == Sender::Ai && self.kind == MessageKind::PlainText
    }
}

/// Lifecycle state of the session controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Idle,
    GeneratingQuestion,
    AwaitingAnswer,
    Evaluating,
    Reviewing,
    Explaining,
}

impl Phase {
    /// A generation call is outstanding
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            Phase::GeneratingQuestion | Phase::Evaluating | Phase::Explaining
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::GeneratingQuestion => "generating question",
            Phase::AwaitingAnswer => "awaiting answer",
            Phase::Evaluating => "evaluating",
            Phase::Reviewing => "reviewing",
            Phase::Explaining => "explaining",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
