//! In-process evaluation of aggregation pipelines.

use serde_json::Value;

use crate::{Collection, Document, Filter, Lookup, Pipeline, Stage, Unwind};

/// Evaluates `pipeline` over `input`, resolving lookup targets with `collection`.
///
/// Documents flow through the stages one at a time and only the ones that
/// pass any leading match stages are cloned. Output order follows input
/// order; a lookup that matches several foreign documents fans out into
/// several outputs once unwound.
pub fn evaluate<'a, F>(input: &[Document], pipeline: &Pipeline, collection: F) -> Vec<Document>
where
    F: Fn(Collection) -> &'a [Document],
{
    let leading = pipeline
        .stages
        .iter()
        .take_while(|stage| matches!(stage, Stage::Match(_)))
        .count();
    let (prefilter, rest) = pipeline.stages.split_at(leading);

    let mut out = Vec::new();
    for doc in input {
        let selected = prefilter.iter().all(|stage| match stage {
            Stage::Match(filter) => filter.matches(doc),
            _ => true,
        });
        if !selected {
            continue;
        }

        let docs = rest.iter().fold(vec![doc.clone()], |docs, stage| match stage {
            Stage::Lookup(lookup) => apply_lookup(docs, lookup, collection(lookup.from)),
            Stage::Unwind(unwind) => apply_unwind(docs, unwind),
            Stage::Match(filter) => apply_match(docs, filter),
        });
        out.extend(docs);
    }
    out
}

fn apply_lookup(docs: Vec<Document>, lookup: &Lookup, foreign: &[Document]) -> Vec<Document> {
    docs.into_iter()
        .map(|mut doc| {
            // A missing local field joins like null, as does a missing foreign field.
            let local = doc.get(&lookup.local_field).cloned().unwrap_or(Value::Null);
            let matches: Vec<Value> = foreign
                .iter()
                .filter(|f| f.get(&lookup.foreign_field).unwrap_or(&Value::Null) == &local)
                .map(|f| Value::Object(f.clone()))
                .collect();
            doc.insert(lookup.as_field.clone(), Value::Array(matches));
            doc
        })
        .collect()
}

fn apply_unwind(docs: Vec<Document>, unwind: &Unwind) -> Vec<Document> {
    let mut out = Vec::with_capacity(docs.len());
    for mut doc in docs {
        let mut elements = match doc.remove(&unwind.path) {
            Some(Value::Array(elements)) => elements,
            None | Some(Value::Null) => Vec::new(),
            Some(scalar) => vec![scalar],
        };

        let Some(last) = elements.pop() else {
            if unwind.preserve_null_and_empty {
                out.push(doc);
            }
            continue;
        };

        for element in elements {
            let mut unwound = doc.clone();
            unwound.insert(unwind.path.clone(), element);
            out.push(unwound);
        }
        doc.insert(unwind.path.clone(), last);
        out.push(doc);
    }
    out
}

fn apply_match(docs: Vec<Document>, filter: &Filter) -> Vec<Document> {
    docs.into_iter().filter(|doc| filter.matches(doc)).collect()
}
