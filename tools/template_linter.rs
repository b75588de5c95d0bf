/// Template Linter - validates choice-set content and reports coverage.
///
/// Usage: template_linter <templates_dir|file> [--coverage]

use encounter_engine::core::library::TemplateLibrary;
use encounter_engine::schema::template::{ChoiceSetTemplate, StateCondition};
use encounter_engine::schema::values::{ValueType, METER_MAX};
use encounter_engine::schema::world::{ActionType, LocationArchetype};
use rustc_hash::FxHashSet;
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: template_linter <templates_dir|file> [--coverage]");
        process::exit(0);
    }

    let templates_path = Path::new(&args[1]);
    let coverage = args[2..].iter().any(|a| a == "--coverage");

    let mut library = TemplateLibrary::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if templates_path.is_file() {
        match TemplateLibrary::load_from_ron(templates_path) {
            Ok(lib) => library.merge(lib),
            Err(e) => {
                eprintln!("ERROR: Failed to load template file: {}", e);
                process::exit(1);
            }
        }
    } else if templates_path.is_dir() {
        load_templates_recursive(templates_path, &mut library, &mut errors, &mut warnings);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", args[1]);
        process::exit(1);
    }

    println!("Loaded {} templates", library.len());

    for template in library.iter() {
        lint_template(template, &mut errors, &mut warnings);
    }

    println!("\n=== Template Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    if coverage {
        print_coverage(&library);
    }

    println!("\nSummary: {} errors, {} warnings", errors.len(), warnings.len());

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_templates_recursive(
    dir: &Path,
    library: &mut TemplateLibrary,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    let mut paths: Vec<_> = match std::fs::read_dir(dir) {
        Ok(entries) => entries.flatten().map(|e| e.path()).collect(),
        Err(e) => {
            errors.push(format!("cannot read {}: {}", dir.display(), e));
            return;
        }
    };
    paths.sort();

    for path in paths {
        if path.is_dir() {
            load_templates_recursive(&path, library, errors, warnings);
        } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            match TemplateLibrary::load_from_ron(&path) {
                Ok(lib) => {
                    println!("  Loaded: {}", path.display());
                    for template in lib.iter() {
                        if library.get(&template.name).is_some() {
                            warnings.push(format!(
                                "template '{}' in {} overrides an earlier definition",
                                template.name,
                                path.display()
                            ));
                        }
                    }
                    library.merge(lib);
                }
                Err(e) => errors.push(format!("{}: {}", path.display(), e)),
            }
        }
    }
}

fn lint_template(template: &ChoiceSetTemplate, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let name = &template.name;

    if template.patterns.len() < 2 {
        warnings.push(format!("template '{}' offers only {} choice", name, template.patterns.len()));
    }

    let mut seen = FxHashSet::default();
    for (i, pattern) in template.patterns.iter().enumerate() {
        if pattern.value_changes.is_empty() {
            errors.push(format!("template '{}' choice {} changes no meter", name, i));
        }
        if !seen.insert((pattern.archetype, pattern.approach)) {
            warnings.push(format!(
                "template '{}' repeats {} - {}",
                name,
                pattern.archetype.label(),
                pattern.approach.label()
            ));
        }
    }

    let has_safe = template
        .patterns
        .iter()
        .any(|p| p.requirements.is_empty() && p.value_changes.iter().all(|c| c.amount >= 0));
    if !has_safe {
        warnings.push(format!("template '{}' has no choice that is safe by default", name));
    }

    for condition in &template.state_conditions {
        if let StateCondition::Min(ValueType::Outcome, n) = condition {
            if *n >= METER_MAX {
                warnings.push(format!(
                    "template '{}' needs Outcome {} but encounters end there",
                    name, n
                ));
            }
        }
    }
}

fn print_coverage(library: &TemplateLibrary) {
    println!("\n=== Coverage ===\n");
    let mut uncovered = 0;
    for action in ActionType::all() {
        let archetypes: Vec<&str> = LocationArchetype::all()
            .iter()
            .filter(|a| library.iter().any(|t| t.matches_site(action, **a)))
            .map(|a| a.label())
            .collect();
        if archetypes.is_empty() {
            uncovered += 1;
            println!("  {:<12} (none)", action.label());
        } else {
            println!("  {:<12} {}", action.label(), archetypes.join(", "));
        }
    }
    println!("\n{} of {} actions have no templates", uncovered, ActionType::all().len());
}
