use serde::{Deserialize, Serialize};

/// An entry of the exercise library, either built in or user-defined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseEntry {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "primary_muscle", alias = "musculo_primario")]
    pub primary_muscle: String,
    #[serde(default, alias = "descripcion")]
    pub description: String,
    #[serde(default)]
    pub custom: bool,
}
