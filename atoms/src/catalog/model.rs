use serde::{Deserialize, Serialize};

/// One checklist item. `completed` is only meaningful inside a shift.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: u32,
    /// Older clients send the label as `text`
    #[serde(alias = "text")]
    pub label: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: String,
    pub name: String,
}

/// The fixed checklist, in display order.
pub const TASK_CATALOG: [(u32, &str); 6] = [
    (1, "Medication Reminder"),
    (2, "Meal Preparation"),
    (3, "Personal Care"),
    (4, "Light Housekeeping"),
    (5, "Companionship"),
    (6, "Mobility Assistance"),
];

pub const CLIENTS: [(&str, &str); 3] = [
    ("1", "Eleanor Vance"),
    ("2", "Arthur Pendelton"),
    ("3", "Beatrice Miller"),
];

/// Fresh checklist with every task incomplete
pub fn catalog_tasks() -> Vec<Task> {
    TASK_CATALOG
        .iter()
        .map(|(id, label)| Task {
            id: *id,
            label: label.to_string(),
            completed: false,
        })
        .collect()
}

pub fn task_label(id: u32) -> Option<&'static str> {
    TASK_CATALOG
        .iter()
        .find(|(task_id, _)| *task_id == id)
        .map(|(_, label)| *label)
}

/// Rebuild a task from a stored id. Ids that left the catalog keep a placeholder label.
pub fn task_from_id(id: u32, completed: bool) -> Task {
    Task {
        id,
        label: task_label(id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("Task {}", id)),
        completed,
    }
}

pub fn clients() -> Vec<Client> {
    CLIENTS
        .iter()
        .map(|(id, name)| Client {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

pub fn find_client(client_id: &str) -> Option<Client> {
    clients().into_iter().find(|c| c.id == client_id)
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub tasks: Vec<Task>,
    pub clients: Vec<Client>,
}

impl CatalogResponse {
    pub fn current() -> Self {
        Self {
            tasks: catalog_tasks(),
            clients: clients(),
        }
    }
}
