use std::path::Path;

use minijinja::{
    escape_formatter, path_loader, value::ValueKind, AutoEscape, Environment, Error, Output,
    State, UndefinedBehavior, Value,
};

/// the templates associated with the site
///
/// templates are loaded on demand from `template_dir` by their file name, so they
/// can include and extend each other. Values are substituted as-is and anything
/// missing renders as nothing. Booleans print the way front-matter spells them.
pub fn get_env<T: AsRef<Path>>(template_dir: T) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(path_loader(template_dir.as_ref()));
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env.set_undefined_behavior(UndefinedBehavior::Lenient);
    env.set_formatter(format_value);
    env
}

fn format_value(out: &mut Output, state: &State, value: &Value) -> Result<(), Error> {
    if value.kind() == ValueKind::Bool {
        out.write_str(if value.is_true() { "true" } else { "false" })?;
        return Ok(());
    }
    escape_formatter(out, state, value)
}
