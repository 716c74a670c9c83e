use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AGENT_TEMPERATURE, AgentRole, Roster};
use crate::llm::{ChatMessage, ChatModel, LlmError};

const TERMINATE: &str = "TERMINATE";
const SELECT_TEMPERATURE: f32 = 0.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: String,
    pub content: String,
}

/// Everything said in one conversation, plus the manager's closing synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub turns: Vec<Turn>,
    pub summary: String,
    /// Specialist turns taken.
    pub rounds: usize,
    /// `true` when the manager ended the conversation before the round limit.
    pub terminated: bool,
}

/// Runs a manager-directed group conversation.
///
/// The proxy posts `initial_message`. Each round the manager names the next
/// specialist (or says `TERMINATE`), and that specialist replies with the
/// whole transcript as context. After at most `max_rounds` specialist turns
/// the manager writes the final synthesis. Any model error aborts the run.
pub async fn converse(
    model: &impl ChatModel,
    roster: &Roster,
    initial_message: &str,
    max_rounds: usize,
) -> Result<Transcript, LlmError> {
    let mut turns = vec![Turn {
        speaker: roster.proxy.name.to_string(),
        content: initial_message.to_string(),
    }];
    let mut last_index: Option<usize> = None;
    let mut terminated = false;
    let mut rounds = 0;

    info!(max_rounds, "conversation started");

    while rounds < max_rounds && !roster.specialists.is_empty() {
        let directive = model
            .chat(&selection_messages(roster, &turns), SELECT_TEMPERATURE)
            .await?;

        if directive.contains(TERMINATE) {
            debug!(rounds, "manager ended the conversation");
            terminated = true;
            break;
        }

        let index = match pick_speaker(&directive, &roster.specialists) {
            Some(i) => i,
            None => {
                let next = last_index.map_or(0, |i| (i + 1) % roster.specialists.len());
                debug!(directive = %directive, fallback = roster.specialists[next].name, "unparseable speaker choice");
                next
            }
        };
        let speaker = &roster.specialists[index];

        let reply = model
            .chat(&speaker_messages(speaker, &turns), AGENT_TEMPERATURE)
            .await?;
        debug!(speaker = speaker.name, chars = reply.len(), "turn taken");

        turns.push(Turn {
            speaker: speaker.name.to_string(),
            content: reply,
        });
        last_index = Some(index);
        rounds += 1;
    }

    let summary = model
        .chat(&synthesis_messages(&roster.manager, &turns), AGENT_TEMPERATURE)
        .await?;

    info!(rounds, terminated, "conversation finished");
    Ok(Transcript {
        turns,
        summary,
        rounds,
        terminated,
    })
}

/// Earliest-mentioned specialist name in the manager's reply, case-insensitive.
fn pick_speaker(directive: &str, specialists: &[AgentRole]) -> Option<usize> {
    let lower = directive.to_lowercase();
    specialists
        .iter()
        .enumerate()
        .filter_map(|(i, role)| lower.find(&role.name.to_lowercase()).map(|pos| (pos, i)))
        .min()
        .map(|(_, i)| i)
}

fn transcript_messages(viewer: &str, turns: &[Turn]) -> Vec<ChatMessage> {
    turns
        .iter()
        .map(|turn| {
            if turn.speaker == viewer {
                ChatMessage::assistant(turn.content.clone())
            } else {
                ChatMessage::user(format!("{}: {}", turn.speaker, turn.content))
            }
        })
        .collect()
}

fn selection_messages(roster: &Roster, turns: &[Turn]) -> Vec<ChatMessage> {
    let names = roster
        .specialists
        .iter()
        .map(|a| a.name)
        .collect::<Vec<_>>()
        .join(", ");

    let mut messages = vec![ChatMessage::system(roster.manager.system_message.clone())];
    messages.extend(transcript_messages(roster.manager.name, turns));
    messages.push(ChatMessage::user(format!(
        "¿Quién debe intervenir a continuación? Responde solo con uno de estos nombres: {names}. \
         Si el equipo ya ha cubierto la tarea, responde únicamente {TERMINATE}."
    )));
    messages
}

fn speaker_messages(speaker: &AgentRole, turns: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(speaker.system_message.clone())];
    messages.extend(transcript_messages(speaker.name, turns));
    messages.push(ChatMessage::user(format!(
        "Continúa la conversación como {}.",
        speaker.name
    )));
    messages
}

fn synthesis_messages(manager: &AgentRole, turns: &[Turn]) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage::system(manager.system_message.clone())];
    messages.extend(transcript_messages(manager.name, turns));
    messages.push(ChatMessage::user(
        "Redacta la respuesta final para el usuario integrando el trabajo del equipo: \
         análisis de la situación, estrategias recomendadas, plan de acción y métricas de éxito.",
    ));
    messages
}
