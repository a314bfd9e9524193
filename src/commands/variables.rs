// ABOUTME: Variable management commands.
// ABOUTME: Prints names and counts only; values never reach the terminal.

use std::collections::BTreeMap;

use railyard::error::{Error, Result};
use railyard::output::Output;

use super::context::AppContext;

pub async fn list(ctx: &AppContext, service_name: &str, output: &mut Output) -> Result<()> {
    let service = ctx.resolve_service(service_name).await?;
    let variables = ctx
        .deployer
        .list_variables(&service.id, &ctx.op_options())
        .await?;

    for variable in &variables {
        output.progress(&format!("{}=***", variable.name));
    }
    output.success(&format!(
        "{} variable(s) on {}",
        variables.len(),
        service.name
    ));
    Ok(())
}

pub async fn set(
    ctx: &AppContext,
    service_name: &str,
    pairs: &[String],
    output: &mut Output,
) -> Result<()> {
    let service = ctx.resolve_service(service_name).await?;
    let variables = parse_pairs(pairs)?;

    let count = ctx
        .deployer
        .set_variables(&service.id, &variables, &ctx.op_options())
        .await?;

    output.success(&format!("Set {} variable(s) on {}", count, service.name));
    Ok(())
}

pub async fn delete(
    ctx: &AppContext,
    service_name: &str,
    name: &str,
    output: &mut Output,
) -> Result<()> {
    let service = ctx.resolve_service(service_name).await?;
    ctx.deployer
        .delete_variable(&service.id, name, &ctx.op_options())
        .await?;

    output.success(&format!("Deleted {} from {}", name, service.name));
    Ok(())
}

fn parse_pairs(pairs: &[String]) -> Result<BTreeMap<String, String>> {
    let mut variables = BTreeMap::new();
    for pair in pairs {
        match pair.split_once('=') {
            Some((name, value)) if !name.is_empty() => {
                variables.insert(name.to_string(), value.to_string());
            }
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "expected KEY=VALUE, got '{pair}'"
                )));
            }
        }
    }
    Ok(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_value_pairs() {
        let pairs = vec!["A=1".to_string(), "B=two=halves".to_string()];
        let parsed = parse_pairs(&pairs).unwrap();
        assert_eq!(parsed.get("A").map(String::as_str), Some("1"));
        assert_eq!(parsed.get("B").map(String::as_str), Some("two=halves"));
    }

    #[test]
    fn rejects_malformed_pairs() {
        assert!(parse_pairs(&["novalue".to_string()]).is_err());
        assert!(parse_pairs(&["=bare".to_string()]).is_err());
    }
}
