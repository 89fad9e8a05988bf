use json_patch::{AddOperation, Patch, PatchOperation};
use jsonptr::PointerBuf;

/// Accumulates JSON Patch operations in the order they are pushed.
#[derive(Debug, Default)]
pub struct PatchBuilder {
    operations: Vec<PatchOperation>,
}

impl PatchBuilder {
    pub fn new() -> Self {
        PatchBuilder::default()
    }

    /// Append an `add` operation. The path is given as unescaped tokens,
    /// escaping happens when the pointer is built.
    pub fn add<I>(&mut self, tokens: I, value: serde_json::Value) -> &mut Self
    where
        I: IntoIterator<Item = String>,
    {
        self.operations.push(PatchOperation::Add(AddOperation {
            path: PointerBuf::from_tokens(tokens),
            value,
        }));
        self
    }

    pub fn build(self) -> Patch {
        Patch(self.operations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(path: &[&str]) -> Vec<String> {
        path.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn operations_keep_insertion_order() {
        let mut builder = PatchBuilder::new();
        builder
            .add(tokens(&["spec", "containers", "2"]), json!(2))
            .add(tokens(&["spec", "containers", "0"]), json!(0));

        let serialized = serde_json::to_value(builder.build()).unwrap();
        assert_eq!(
            serialized,
            json!([
                {"op": "add", "path": "/spec/containers/2", "value": 2},
                {"op": "add", "path": "/spec/containers/0", "value": 0}
            ])
        );
    }

    #[test]
    fn tokens_are_escaped() {
        let mut builder = PatchBuilder::new();
        builder.add(
            tokens(&["metadata", "annotations", "example.com/limits"]),
            json!("set"),
        );

        let serialized = serde_json::to_value(builder.build()).unwrap();
        assert_eq!(
            serialized[0]["path"],
            "/metadata/annotations/example.com~1limits"
        );
    }

    #[test]
    fn empty_builder() {
        assert!(PatchBuilder::new().build().0.is_empty());
    }
}
