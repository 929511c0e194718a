//! Namespace synthesis for `import * as X` / `export * as X`.
//!
//! One object per target module, whatever the number of aliases pointing at
//! it. Members are listed by final name; a member that is itself a namespace
//! object nests one level per re-export hop.

use crate::reachability::ReachableSet;
use crate::rewrite::Rewriter;
use crate::{ModuleId, Result, SymbolId};

/// Render `declare namespace <final> { export { ... }; }` for a namespace
/// object.
pub fn synthesize(
    rewriter: &Rewriter<'_>,
    reachable: &ReachableSet,
    namespace: SymbolId,
    target: &ModuleId,
) -> Result<String> {
    let name = rewriter.final_name(namespace, target)?;
    let members = reachable.namespace_members(namespace).unwrap_or_default();

    if members.is_empty() {
        return Ok(format!("declare namespace {name} {{}}"));
    }

    let mut specifiers = Vec::with_capacity(members.len());
    for member in members {
        let local = rewriter.final_name(member.target, target)?;
        if local == member.exported {
            specifiers.push(local.to_string());
        } else {
            specifiers.push(format!("{local} as {}", member.exported));
        }
    }

    Ok(format!(
        "declare namespace {name} {{\n  export {{ {} }};\n}}",
        specifiers.join(", ")
    ))
}
