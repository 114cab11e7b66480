//! Maps a navigation path to the context the assistant is grounded on.
//!
//! Both tables are closed and known at build time. Lookups are exact on the path.

use crate::models::{ChatContext, APP_INFO};
use std::collections::BTreeMap;

/// Route name used for paths missing from [`ROUTE_NAMES`].
pub const UNKNOWN_ROUTE: &str = "Unknown";

pub const ROUTE_NAMES: &[(&str, &str)] = &[
    ("/", "Inicio"),
    ("/fuentes", "Fuentes ETL"),
    ("/dimensiones/territorios", "Dimensión Territorios"),
    ("/dimensiones/tiempo", "Dimensión Tiempo"),
    ("/dimensiones/campos", "Dimensión Campos"),
    ("/dimensiones/areas-electricas", "Dimensión Áreas Eléctricas"),
    ("/upme/demanda-energia", "Proyección de Demanda de Energía Eléctrica"),
    ("/upme/gas-natural", "Proyección de Demanda de Gas Natural"),
    ("/upme/potencia-maxima", "Proyección de Potencia Máxima"),
    ("/upme/capacidad-instalada", "Proyección de Capacidad Instalada"),
];

pub const ROUTE_DATASETS: &[(&str, &[(&str, bool)])] = &[
    (
        "/",
        &[
            ("fuentes", true),
            ("territorios", false),
            ("tiempo", false),
            ("proyecciones", false),
        ],
    ),
    ("/fuentes", &[("fuentes", true)]),
    (
        "/dimensiones/territorios",
        &[("territorios", true), ("tiempo", false)],
    ),
    (
        "/dimensiones/tiempo",
        &[("territorios", false), ("tiempo", true)],
    ),
    ("/dimensiones/campos", &[("campos", true), ("territorios", true)]),
    (
        "/dimensiones/areas-electricas",
        &[("areas_electricas", true), ("territorios", true)],
    ),
    (
        "/upme/demanda-energia",
        &[
            ("areas_electricas", true),
            ("proyecciones", true),
            ("territorios", true),
            ("tiempo", true),
        ],
    ),
    (
        "/upme/gas-natural",
        &[
            ("proyecciones", true),
            ("territorios", true),
            ("tiempo", true),
        ],
    ),
    (
        "/upme/potencia-maxima",
        &[
            ("areas_electricas", true),
            ("proyecciones", true),
            ("tiempo", true),
        ],
    ),
    (
        "/upme/capacidad-instalada",
        &[
            ("campos", false),
            ("proyecciones", true),
            ("tiempo", true),
        ],
    ),
];

const DATASET_LABELS: &[(&str, &str)] = &[
    ("fuentes", "registro de fuentes ETL"),
    ("territorios", "dimensión de territorios (departamentos y municipios)"),
    ("tiempo", "dimensión de tiempo"),
    ("campos", "dimensión de campos de producción"),
    ("areas_electricas", "dimensión de áreas eléctricas"),
    ("proyecciones", "proyecciones UPME"),
];

/// Build the context for `path`. Total: unknown paths get `"Unknown"` and no datasets.
pub fn build_context(path: &str) -> ChatContext {
    let route_name = ROUTE_NAMES
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_ROUTE);

    let available_data: BTreeMap<String, bool> = ROUTE_DATASETS
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, flags)| {
            flags
                .iter()
                .map(|(flag, available)| (flag.to_string(), *available))
                .collect()
        })
        .unwrap_or_default();

    ChatContext {
        current_route: path.to_string(),
        route_name: route_name.to_string(),
        available_data,
        app_info: APP_INFO,
    }
}

/// Human-readable label of a dataset flag; unknown flags are shown as-is.
pub fn dataset_label(flag: &str) -> &str {
    DATASET_LABELS
        .iter()
        .find(|(name, _)| *name == flag)
        .map(|(_, label)| *label)
        .unwrap_or(flag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_paths_resolve_to_table_values() {
        for (path, name) in ROUTE_NAMES {
            let context = build_context(path);
            assert_eq!(context.current_route, *path);
            assert_eq!(context.route_name, *name);
        }

        for (path, flags) in ROUTE_DATASETS {
            let context = build_context(path);
            assert_eq!(context.available_data.len(), flags.len());
            for (flag, available) in flags.iter() {
                assert_eq!(context.available_data.get(*flag), Some(available));
            }
        }
    }

    #[test]
    fn unregistered_paths_degrade_to_unknown() {
        for path in ["", "/nope", "/fuentes/", "/FUENTES", "/upme", "not a path ✓"] {
            let context = build_context(path);
            assert_eq!(context.current_route, path);
            assert_eq!(context.route_name, UNKNOWN_ROUTE);
            assert!(context.available_data.is_empty());
        }
    }

    #[test]
    fn tables_cover_the_same_routes() {
        for (path, _) in ROUTE_NAMES {
            assert!(
                ROUTE_DATASETS.iter().any(|(route, _)| route == path),
                "{} has no dataset flags",
                path
            );
        }
    }

    #[test]
    fn every_flag_has_a_label() {
        for (_, flags) in ROUTE_DATASETS {
            for (flag, _) in flags.iter() {
                assert_ne!(dataset_label(flag), *flag, "{} has no label", flag);
            }
        }
        assert_eq!(dataset_label("otro"), "otro");
    }

    #[test]
    fn app_info_is_constant() {
        assert_eq!(build_context("/").app_info, build_context("/x").app_info);
        assert_eq!(build_context("/").app_info.name, "Suria");
    }

    #[test]
    fn available_datasets_lists_only_true_flags() {
        let context = build_context("/dimensiones/tiempo");
        assert_eq!(context.available_datasets(), vec!["tiempo"]);
    }
}
