//! System prompt construction.

use super::context::dataset_label;
use crate::models::ChatContext;

/// Marker used when the route exposes no dataset.
pub const NO_DATASETS: &str = "ninguno";

/// Render the system prompt for `context`.
///
/// The output always contains the app name, the route path, the route display
/// name, and the available datasets (or [`NO_DATASETS`]).
pub fn build_system_prompt(context: &ChatContext) -> String {
    let datasets = context.available_datasets();
    let datasets = if datasets.is_empty() {
        NO_DATASETS.to_string()
    } else {
        datasets
            .iter()
            .map(|flag| dataset_label(flag))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "Eres el asistente virtual de {name} (versión {version}). {description}.\n\n\
         Contexto actual del usuario:\n\
         - Sección: {route_name}\n\
         - Ruta: {route}\n\
         - Datos disponibles en esta sección: {datasets}\n\n\
         Responde siempre en español, de forma breve y precisa. Apóyate en el contexto \
         de la sección para orientar al usuario sobre los datos que puede consultar. \
         Si una pregunta requiere datos que no están disponibles en esta sección, \
         indícalo y sugiere dónde encontrarlos dentro de {name}. No inventes cifras.",
        name = context.app_info.name,
        version = context.app_info.version,
        description = context.app_info.description,
        route_name = context.route_name,
        route = context.current_route,
        datasets = datasets,
    )
}
