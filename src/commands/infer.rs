use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, Span, SyntaxShape, Type, Value,
};

use super::util;
use crate::algo::dataset;
use crate::config::DatasetConfig;
use crate::DatasetPlugin;

pub struct Infer;

impl PluginCommand for Infer {
    type Plugin = DatasetPlugin;

    fn name(&self) -> &str {
        "dataset infer"
    }

    fn description(&self) -> &str {
        "Flatten documents and infer a schema: returns {schema, rows, sampleRows}"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::Any),
                (Type::record(), Type::Any),
            ])
            .named(
                "flatten",
                SyntaxShape::String,
                "Flatten policy: shallow, deep (default: shallow)",
                Some('f'),
            )
            .named(
                "config",
                SyntaxShape::Filepath,
                "TOML settings file",
                None,
            )
            .switch(
                "schema-only",
                "Return only the schema fields as a table",
                Some('s'),
            )
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["infer", "schema", "flatten", "mongodb", "bson", "types"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "open users.json | dataset infer",
                description: "Infer the dataset shape of a MongoDB export",
                result: None,
            },
            Example {
                example: "[{name: ada, profile: {age: 36}}] | dataset infer --schema-only",
                description: "Show field names and types only",
                result: None,
            },
        ]
    }

    fn run(
        &self,
        _plugin: &DatasetPlugin,
        _engine: &EngineInterface,
        call: &EvaluatedCall,
        input: PipelineData,
    ) -> Result<PipelineData, LabeledError> {
        let head = call.head;
        let config = util::config_from_call(call)?;
        let schema_only = call.has_flag("schema-only")?;

        let values = util::collect_input(input);
        let output = infer_values(&values, &config, schema_only, head)?;
        Ok(PipelineData::Value(output, None))
    }
}

/// Assemble pipeline values into the dataset record, or the field table
/// alone when `schema_only` is set.
fn infer_values(
    values: &[Value],
    config: &DatasetConfig,
    schema_only: bool,
    head: Span,
) -> Result<Value, LabeledError> {
    let ds = dataset::assemble_with(&util::to_documents(values), config);

    let json = if schema_only {
        serde_json::to_value(&ds.schema.fields)
    } else {
        serde_json::to_value(&ds)
    }
    .map_err(|e| LabeledError::new(format!("Could not encode dataset: {e}")))?;

    Ok(util::json_to_nu(&json, head))
}
