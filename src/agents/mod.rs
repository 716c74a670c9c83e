//! The agency: a fixed roster of role-prompted agents sharing one chat model.

mod conversation;
mod tools;

pub use conversation::{Transcript, converse};
pub use tools::{analyze_sentiment, translate_to_english, write_content};

pub const USER_PROXY: &str = "User_Proxy";
pub const MANAGER: &str = "Agency_Manager";
pub const RESEARCHER: &str = "Agency_Researcher";
pub const WRITER: &str = "Agency_Writer";

/// Temperature for every agent turn.
pub const AGENT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, PartialEq)]
pub struct AgentRole {
    pub name: &'static str,
    pub system_message: String,
}

/// Who takes part in a conversation. The proxy only opens it; the manager
/// directs and closes it; specialists do the talking in between.
#[derive(Debug, Clone)]
pub struct Roster {
    pub proxy: AgentRole,
    pub manager: AgentRole,
    pub specialists: Vec<AgentRole>,
}

pub fn default_roster(brand_task: &str, user_task: &str) -> Roster {
    Roster {
        proxy: AgentRole {
            name: USER_PROXY,
            system_message: "Un proxy para interactuar con el usuario y coordinar las tareas."
                .to_string(),
        },
        manager: AgentRole {
            name: MANAGER,
            system_message: format!(
                "Como Gerente de Proyecto para {brand_task}, tu tarea es:\n\
                 1. Coordinar el equipo para resolver {user_task}\n\
                 2. Asegurar que las soluciones sean prácticas y efectivas\n\
                 3. Priorizar tareas y recursos\n\
                 4. Proporcionar un plan de acción claro"
            ),
        },
        specialists: vec![
            AgentRole {
                name: RESEARCHER,
                system_message: format!(
                    "Como Investigador Principal para {brand_task}, tu tarea es:\n\
                     1. Investigar sobre {user_task} usando fuentes actualizadas\n\
                     2. Analizar la competencia y tendencias del mercado\n\
                     3. Proporcionar datos y estadísticas relevantes\n\
                     4. Identificar oportunidades y amenazas"
                ),
            },
            AgentRole {
                name: WRITER,
                system_message: format!(
                    "Como Redactor Creativo para {brand_task}, tu tarea es:\n\
                     1. Crear contenido persuasivo y relevante sobre {user_task}\n\
                     2. Adaptar el mensaje al público objetivo\n\
                     3. Incorporar datos de la investigación en el contenido\n\
                     4. Optimizar el contenido para SEO"
                ),
            },
        ],
    }
}
