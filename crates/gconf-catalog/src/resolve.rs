//! Late-bound reference resolution
//!
//! `@Comp.Prop` values stay deferred until freeze, so the referencing
//! property takes the referenced property's final value regardless of
//! assignment order.

use crate::catalog::Catalog;
use crate::error::{CatalogError, CatalogResult};
use gconf_property::Value;

type Slot = (String, String);

/// Replace every `@ref` in the catalog by the value it denotes
pub(crate) fn resolve_references(catalog: &mut Catalog) -> CatalogResult<usize> {
    let pending: Vec<Slot> = catalog
        .entries
        .iter()
        .flat_map(|(name, conf)| {
            conf.properties()
                .iter()
                .filter(|(_, p)| p.value().contains_ref())
                .map(move |(key, _)| (name.clone(), key.clone()))
        })
        .collect();

    for (component, key) in &pending {
        let raw = catalog.value(component, key)?.clone();
        let mut chain = vec![(component.clone(), key.clone())];
        let resolved = resolve_value(catalog, component, key, raw, &mut chain)?;
        let slot = catalog
            .entries
            .get_mut(component)
            .and_then(|c| c.property_mut(key))
            .ok_or_else(|| CatalogError::NotFound(format!("{component}.{key}")))?;
        let source = slot.source();
        slot.set(resolved, source)
            .map_err(|shape| CatalogError::property(component, shape.for_property(key)))?;
    }
    Ok(pending.len())
}

fn resolve_value(
    catalog: &Catalog,
    component: &str,
    key: &str,
    value: Value,
    chain: &mut Vec<Slot>,
) -> CatalogResult<Value> {
    let each = |items: Vec<Value>, chain: &mut Vec<Slot>| -> CatalogResult<Vec<Value>> {
        items
            .into_iter()
            .map(|v| resolve_value(catalog, component, key, v, chain))
            .collect()
    };
    match value {
        Value::Ref(reference) => {
            let target = (reference.component.clone(), reference.property.clone());
            if chain.len() == 1 && chain[0] == target {
                return Err(CatalogError::SelfReference {
                    component: component.to_string(),
                    property: key.to_string(),
                });
            }
            if chain.contains(&target) {
                let mut names: Vec<String> = chain.iter().map(|(c, p)| format!("{c}.{p}")).collect();
                names.push(format!("{}.{}", target.0, target.1));
                return Err(CatalogError::ReferenceCycle(names.join(" -> ")));
            }
            let next = catalog
                .value(&reference.component, &reference.property)
                .map_err(|_| CatalogError::UnresolvedReference {
                    component: component.to_string(),
                    property: key.to_string(),
                    target: format!("{}.{}", reference.component, reference.property),
                })?
                .clone();
            chain.push(target);
            let out = resolve_value(catalog, component, key, next, chain);
            chain.pop();
            out
        }
        Value::List(items) => each(items, chain).map(Value::List),
        Value::Tuple(items) => each(items, chain).map(Value::Tuple),
        Value::Set(items) => each(items, chain).map(Value::Set),
        Value::Map(entries) => entries
            .into_iter()
            .map(|(k, v)| {
                Ok((
                    resolve_value(catalog, component, key, k, chain)?,
                    resolve_value(catalog, component, key, v, chain)?,
                ))
            })
            .collect::<CatalogResult<Vec<_>>>()
            .map(Value::Map),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use crate::{Catalog, CatalogError, TypeRegistry};
    use gconf_property::{PropertyRef, Source, Value};

    fn generic(names: &[&str]) -> Catalog {
        let mut cat = Catalog::new(TypeRegistry::new());
        for name in names {
            cat.lookup_or_generic(name).unwrap();
        }
        cat
    }

    #[test]
    fn test_reference_takes_final_value() {
        let mut cat = generic(&["Alg"]);
        cat.set("Alg", "Prop", Value::list(["a"]), Source::Options).unwrap();
        cat.set("Alg", "Prop", PropertyRef::new("Alg", "RefProp"), Source::Options).unwrap();
        cat.set("Alg", "RefProp", Value::list(["b"]), Source::Options).unwrap();
        cat.freeze().unwrap();
        assert_eq!(cat.value("Alg", "Prop").unwrap(), &Value::list(["b"]));
        assert_eq!(cat.value("Alg", "RefProp").unwrap(), &Value::list(["b"]));
    }

    #[test]
    fn test_reference_chain() {
        let mut cat = generic(&["A", "B", "C"]);
        cat.set("A", "P", PropertyRef::new("B", "P"), Source::Options).unwrap();
        cat.set("B", "P", PropertyRef::new("C", "P"), Source::Options).unwrap();
        cat.set("C", "P", 42, Source::Options).unwrap();
        cat.freeze().unwrap();
        assert_eq!(cat.value("A", "P").unwrap(), &Value::Int(42));
    }

    #[test]
    fn test_nested_reference_in_list() {
        let mut cat = generic(&["A", "B"]);
        cat.set("B", "X", "x", Source::Options).unwrap();
        cat.set(
            "A",
            "L",
            Value::list([Value::from("a"), Value::Ref(PropertyRef::new("B", "X"))]),
            Source::Options,
        )
        .unwrap();
        cat.freeze().unwrap();
        assert_eq!(cat.value("A", "L").unwrap(), &Value::list(["a", "x"]));
    }

    #[test]
    fn test_missing_target() {
        let mut cat = generic(&["A"]);
        cat.set("A", "P", PropertyRef::new("Nowhere", "P"), Source::Options).unwrap();
        let err = cat.freeze().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot find property 'Nowhere.P' referenced by A.P"
        );
        assert!(!cat.is_frozen());
    }

    #[test]
    fn test_cycle_detected() {
        let mut cat = generic(&["A", "B"]);
        cat.set("A", "P", PropertyRef::new("B", "P"), Source::Options).unwrap();
        cat.set("B", "P", PropertyRef::new("A", "P"), Source::Options).unwrap();
        assert!(matches!(cat.freeze().unwrap_err(), CatalogError::ReferenceCycle(_)));
    }
}
