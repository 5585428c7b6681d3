//! Read-only CMOP queries
//!
//! Each tool is a thin pass-through of the transport envelope.

use async_trait::async_trait;
use cmop_client::CmopApi;
use cmop_common::{ClosedEnum, Envelope, EvacStage, TriageColor};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{parse_args, parse_enum, ParamSpec, ParamType, ToolError, ToolRegistry, ToolTrait};

/// Default radius for `get_nearby_entities`
pub const DEFAULT_NEARBY_RADIUS_M: i64 = 5000;

/// Tools without parameters that forward one client call
macro_rules! no_arg_tool {
    ($tool:ident, $name:literal, $doc:literal, $method:ident) => {
        pub struct $tool {
            api: Arc<dyn CmopApi>,
        }

        impl $tool {
            pub fn new(api: Arc<dyn CmopApi>) -> Self {
                Self { api }
            }
        }

        #[async_trait]
        impl ToolTrait for $tool {
            fn name(&self) -> &str {
                $name
            }

            fn doc(&self) -> &str {
                $doc
            }

            fn params(&self) -> Vec<ParamSpec> {
                Vec::new()
            }

            async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
                parse_args::<NoArgs>(args)?;
                Ok(self.api.$method().await)
            }
        }
    };
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

no_arg_tool!(
    GetAllEntitiesTool,
    "get_all_entities",
    "Get all entities from CMOP map (military units, casualties, facilities).",
    get_entities
);

no_arg_tool!(
    GetCasualtiesTool,
    "get_casualties",
    "Get all casualties (entities with medical records) including triage, evac stage, vital signs, and 9-Line data.",
    get_casualties
);

no_arg_tool!(
    GetSchemaTool,
    "get_schema",
    "Get CMOP schema with valid categories, triage colors, evac stages, facility roles, and 9-Line MEDEVAC format.",
    get_schema
);

no_arg_tool!(
    GetScenariosTool,
    "get_available_scenarios",
    "List available scenarios that can be loaded.",
    get_scenarios
);

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EntityIdArgs {
    entity_id: i64,
}

pub struct GetEntityByIdTool {
    api: Arc<dyn CmopApi>,
}

impl GetEntityByIdTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for GetEntityByIdTool {
    fn name(&self) -> &str {
        "get_entity_by_id"
    }

    fn doc(&self) -> &str {
        "Get single entity by numeric ID with full medical details."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("entity_id", ParamType::Integer)]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: EntityIdArgs = parse_args(args)?;
        Ok(self.api.get_entity(args.entity_id).await)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CategoryArgs {
    category: String,
}

pub struct GetEntitiesByCategoryTool {
    api: Arc<dyn CmopApi>,
}

impl GetEntitiesByCategoryTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for GetEntitiesByCategoryTool {
    fn name(&self) -> &str {
        "get_entities_by_category"
    }

    fn doc(&self) -> &str {
        "Get entities filtered by category.

Args:
    category: Entity category (infantry, armoured, casualty, medical_facility, medevac_unit, etc.)."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("category", ParamType::String)]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: CategoryArgs = parse_args(args)?;
        Ok(self.api.get_entities_by_category(&args.category).await)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TriageArgs {
    color: String,
}

pub struct GetCasualtiesByTriageTool {
    api: Arc<dyn CmopApi>,
}

impl GetCasualtiesByTriageTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for GetCasualtiesByTriageTool {
    fn name(&self) -> &str {
        "get_casualties_by_triage"
    }

    fn doc(&self) -> &str {
        "Get casualties filtered by triage color.

Args:
    color: Triage color: RED (T1 immediate), YELLOW (T2 urgent), GREEN (T3 minimal), BLUE (T4 expectant), BLACK (deceased), UNKNOWN."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("color", ParamType::of::<TriageColor>())]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: TriageArgs = parse_args(args)?;
        let color: TriageColor = parse_enum("color", &args.color)?;
        Ok(self.api.get_casualties_by_triage(color.as_str()).await)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct StageArgs {
    stage: String,
}

pub struct GetCasualtiesByEvacStageTool {
    api: Arc<dyn CmopApi>,
}

impl GetCasualtiesByEvacStageTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for GetCasualtiesByEvacStageTool {
    fn name(&self) -> &str {
        "get_casualties_by_evac_stage"
    }

    fn doc(&self) -> &str {
        "Get casualties filtered by evacuation stage.

Args:
    stage: Evacuation stage: at_poi (point of injury), in_transit (being evacuated), delivered (at facility), unknown."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("stage", ParamType::of::<EvacStage>())]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: StageArgs = parse_args(args)?;
        let stage: EvacStage = parse_enum("stage", &args.stage)?;
        Ok(self.api.get_casualties_by_evac_stage(stage.as_str()).await)
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NearbyArgs {
    longitude: f64,
    latitude: f64,
    #[serde(default = "default_nearby_radius")]
    radius_m: i64,
}

fn default_nearby_radius() -> i64 {
    DEFAULT_NEARBY_RADIUS_M
}

pub struct GetNearbyEntitiesTool {
    api: Arc<dyn CmopApi>,
}

impl GetNearbyEntitiesTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for GetNearbyEntitiesTool {
    fn name(&self) -> &str {
        "get_nearby_entities"
    }

    fn doc(&self) -> &str {
        "Find entities within radius of coordinates.

Args:
    longitude: WGS84 longitude.
    latitude: WGS84 latitude.
    radius_m: Search radius in meters (default 5000)."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("longitude", ParamType::Number),
            ParamSpec::required("latitude", ParamType::Number),
            ParamSpec::optional("radius_m", ParamType::Integer, DEFAULT_NEARBY_RADIUS_M),
        ]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: NearbyArgs = parse_args(args)?;
        Ok(self
            .api
            .get_nearby_entities(args.longitude, args.latitude, args.radius_m)
            .await)
    }
}

pub struct GetNineLineTool {
    api: Arc<dyn CmopApi>,
}

impl GetNineLineTool {
    pub fn new(api: Arc<dyn CmopApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ToolTrait for GetNineLineTool {
    fn name(&self) -> &str {
        "get_nine_line"
    }

    fn doc(&self) -> &str {
        "Get the 9-Line MEDEVAC request data for a specific casualty.

Args:
    entity_id: Casualty entity ID."
    }

    fn params(&self) -> Vec<ParamSpec> {
        vec![ParamSpec::required("entity_id", ParamType::Integer)]
    }

    async fn execute(&self, args: Value) -> Result<Envelope, ToolError> {
        let args: EntityIdArgs = parse_args(args)?;
        Ok(self.api.get_nine_line(args.entity_id).await)
    }
}

/// Register the read-only query tools
pub fn register_basic_tools(registry: &mut ToolRegistry, api: Arc<dyn CmopApi>) {
    registry.register(GetAllEntitiesTool::new(api.clone()));
    registry.register(GetEntityByIdTool::new(api.clone()));
    registry.register(GetEntitiesByCategoryTool::new(api.clone()));
    registry.register(GetCasualtiesTool::new(api.clone()));
    registry.register(GetCasualtiesByTriageTool::new(api.clone()));
    registry.register(GetCasualtiesByEvacStageTool::new(api.clone()));
    registry.register(GetNearbyEntitiesTool::new(api.clone()));
    registry.register(GetNineLineTool::new(api.clone()));
    registry.register(GetSchemaTool::new(api.clone()));
    registry.register(GetScenariosTool::new(api));
}
