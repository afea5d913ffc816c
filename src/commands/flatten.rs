use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, ListStream, PipelineData, Signals, Signature, Span,
    SyntaxShape, Type, Value,
};

use super::util;
use crate::algo::dataset;
use crate::algo::flatten::FlattenDepth;
use crate::DatasetPlugin;

pub struct Flatten;

impl PluginCommand for Flatten {
    type Plugin = DatasetPlugin;

    fn name(&self) -> &str {
        "dataset flatten"
    }

    fn description(&self) -> &str {
        "Flatten nested records into dotted columns and normalize BSON values"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::table()),
                (Type::record(), Type::table()),
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
            .category(Category::Experimental)
    }

    fn search_terms(&self) -> Vec<&str> {
        vec!["flatten", "dotted", "nested", "normalize", "bson"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![
            Example {
                example: "[{_id: 1, profile: {age: 36, address: {city: Oslo}}}] | dataset flatten",
                description: "One level: yields `profile.age` and `profile.address` as a record",
                result: None,
            },
            Example {
                example: "[{profile: {address: {city: Oslo}}}] | dataset flatten --flatten deep",
                description: "Recurse to the leaves: yields `profile.address.city`",
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

        let values = util::collect_input(input);
        if values.is_empty() {
            return Ok(PipelineData::Value(Value::list(vec![], head), None));
        }

        let rows = flatten_values(&values, config.flatten, head);
        Ok(ListStream::new(rows.into_iter(), head, Signals::empty()).into())
    }
}

fn flatten_values(values: &[Value], depth: FlattenDepth, head: Span) -> Vec<Value> {
    dataset::flatten_all(&util::to_documents(values), depth)
        .into_iter()
        .map(|row| util::json_to_nu(&serde_json::Value::Object(row), head))
        .collect()
}
