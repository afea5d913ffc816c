use nu_plugin::{EngineInterface, EvaluatedCall, PluginCommand};
use nu_protocol::{
    Category, Example, LabeledError, PipelineData, Signature, Span, SyntaxShape, Type, Value,
};

use super::util;
use crate::algo::{dataset, profile};
use crate::config::DatasetConfig;
use crate::DatasetPlugin;

pub struct Profile;

impl PluginCommand for Profile {
    type Plugin = DatasetPlugin;

    fn name(&self) -> &str {
        "dataset profile"
    }

    fn description(&self) -> &str {
        "Per-field statistics of the flattened dataset: type, nulls, cardinality, top values"
    }

    fn signature(&self) -> Signature {
        Signature::build(self.name())
            .input_output_types(vec![
                (Type::table(), Type::record()),
                (Type::record(), Type::record()),
            ])
            .named(
                "flatten",
                SyntaxShape::String,
                "Flatten policy: shallow, deep (default: shallow)",
                Some('f'),
            )
            .named(
                "threshold",
                SyntaxShape::Int,
                "Distinct-value cutoff for categorical string fields (default: 50)",
                Some('t'),
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
        vec!["profile", "stats", "cardinality", "nulls", "categorical"]
    }

    fn examples(&self) -> Vec<Example<'_>> {
        vec![Example {
            example: "[[status qty]; [open 1] [closed 2] [open 3]] | dataset profile",
            description: "Field statistics with categorical detection",
            result: None,
        }]
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
        let output = profile_values(&values, &config, head)?;
        Ok(PipelineData::Value(output, None))
    }
}

fn profile_values(
    values: &[Value],
    config: &DatasetConfig,
    head: Span,
) -> Result<Value, LabeledError> {
    let ds = dataset::assemble_with(&util::to_documents(values), config);
    let report = profile::profile_dataset(&ds, config.cardinality_threshold);

    let json = serde_json::to_value(&report)
        .map_err(|e| LabeledError::new(format!("Could not encode profile: {e}")))?;
    Ok(util::json_to_nu(&json, head))
}
