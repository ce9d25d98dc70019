pub mod execute;
pub mod handlers;
pub mod normalize;
pub mod params;
pub mod schema;
pub mod validation;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::history::UndoState;
use crate::model::Document;

// ── Param types (used in Command enum) ──────────────────────────
use params::{
    CreateCanvasParams, CreateLayerParams, ElementRef, EllipseParams, ExportPngParams,
    ImportImageParams, LayerLockParams, LayerOpacityParams, LayerRef, LayerVisibilityParams,
    LineParams, ProjectFileParams, RectangleParams, ReorderLayerParams, StyleParams,
    TextCreateParams, TextUpdateParams, TransformParams,
};

// ── Handler modules (dispatch targets) ──────────────────────────
use handlers::{canvas, element, history, layer, media, project, shape, text};

// ── Command output ──────────────────────────────────────────────

/// Snapshot returned by `canvas:get-state`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct CanvasState {
    pub project: Document,
    pub history: UndoState,
}

/// The `data` field of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum CommandData {
    None,
    #[serde(rename_all = "camelCase")]
    Element {
        element_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Layer {
        layer_id: String,
    },
    File {
        path: Option<String>,
    },
    State(Box<CanvasState>),
    History(UndoState),
    Document(Box<Document>),
}

/// Internal result of executing a Command.
/// `message` is for logs and the CLI, `data` goes back over the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    pub message: String,
    pub data: CommandData,
}

impl CommandOutput {
    pub fn unit(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: CommandData::None,
        }
    }

    pub fn data(message: impl Into<String>, data: CommandData) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }

    /// The wire form of `data`.
    pub fn into_value(self) -> Result<Value, AppError> {
        Ok(serde_json::to_value(self.data)?)
    }
}

// ── define_commands! macro ──────────────────────────────────────

/// Single source of truth for the canonical command set. Generates:
/// 1. `Command` enum (serde-tagged as `{type, payload}`)
/// 2. `Command::kind()`: the canonical type string
/// 3. `Command::parse()`: build a Command from a `(type, payload)` pair
/// 4. `Command::dispatch()`: execute any variant against the host state
/// 5. `Command::KINDS` (tests only): every canonical type, in declaration order
macro_rules! define_commands {
    (
        params {
            $( $pv:ident ( $pp:ty ) => $ph:path, $pn:literal ; )*
        }
        no_params {
            $( $nv:ident => $nh:path, $nn:literal ; )*
        }
        async_params {
            $( $apv:ident ( $app:ty ) => $aph:path, $apn:literal ; )*
        }
    ) => {
        // ── 1. Command enum ──
        /// Every operation the host can perform. Adding a variant causes compiler
        /// errors until it is fully handled.
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "type", content = "payload")]
        pub enum Command {
            $( #[serde(rename = $pn)] $pv($pp), )*
            $( #[serde(rename = $nn)] $nv, )*
            $( #[serde(rename = $apn)] $apv($app), )*
        }

        impl Command {
            // ── 2. Command::kind() ──
            pub fn kind(&self) -> &'static str {
                match self {
                    $( Command::$pv(_) => $pn, )*
                    $( Command::$nv => $nn, )*
                    $( Command::$apv(_) => $apn, )*
                }
            }

            // ── 3. Command::parse() ──
            /// A null payload is treated as `{}`. Unknown fields are ignored.
            pub fn parse(kind: &str, payload: Value) -> Result<Command, AppError> {
                let payload = if payload.is_null() {
                    Value::Object(Map::new())
                } else {
                    payload
                };
                match kind {
                    $( $pn => Ok(Command::$pv(de(kind, payload)?)), )*
                    $( $nn => Ok(Command::$nv), )*
                    $( $apn => Ok(Command::$apv(de(kind, payload)?)), )*
                    _ => Err(AppError::validation(format!("Unknown command: {kind}"))),
                }
            }

            // ── 4. Command::dispatch() ──
            pub(crate) async fn dispatch(
                self,
                state: &mut crate::state::HostState,
            ) -> Result<CommandOutput, AppError> {
                match self {
                    $( Command::$pv(p) => $ph(&mut state.store, p), )*
                    $( Command::$nv => $nh(&mut state.store), )*
                    $( Command::$apv(p) => $aph(state, p).await, )*
                }
            }

            // ── 5. Command::KINDS ──
            #[cfg(test)]
            pub const KINDS: &'static [&'static str] = &[ $( $pn, )* $( $nn, )* $( $apn, )* ];
        }
    };
}

fn de<T: serde::de::DeserializeOwned>(kind: &str, payload: Value) -> Result<T, AppError> {
    serde_json::from_value(payload).map_err(|e| AppError::validation(format!("{kind}: {e}")))
}

// ── Command definitions ─────────────────────────────────────────

define_commands! {
    params {
        CreateCanvas(CreateCanvasParams) => canvas::create, "canvas:create";

        CreateLayer(CreateLayerParams) => layer::create, "layer:create";
        DeleteLayer(LayerRef) => layer::delete, "layer:delete";
        ReorderLayer(ReorderLayerParams) => layer::reorder, "layer:reorder";
        SetLayerVisibility(LayerVisibilityParams) => layer::set_visibility, "layer:set-visibility";
        SetLayerOpacity(LayerOpacityParams) => layer::set_opacity, "layer:set-opacity";
        LockLayer(LayerLockParams) => layer::lock, "layer:lock";

        AddRectangle(RectangleParams) => shape::rectangle, "shape:rectangle";
        AddEllipse(EllipseParams) => shape::ellipse, "shape:ellipse";
        AddLine(LineParams) => shape::line, "shape:line";

        CreateText(TextCreateParams) => text::create, "text:create";
        UpdateText(TextUpdateParams) => text::update, "text:update";

        TransformElement(TransformParams) => element::transform, "element:transform";
        StyleElement(StyleParams) => element::style, "element:style";
        DeleteElement(ElementRef) => element::delete, "element:delete";
        DuplicateElement(ElementRef) => element::duplicate, "element:duplicate";
    }
    no_params {
        GetState => canvas::get_state, "canvas:get-state";
        ClearCanvas => canvas::clear, "canvas:clear";
        ExportCanvas => canvas::export, "export:canvas";
        Undo => history::undo, "history:undo";
        Redo => history::redo, "history:redo";
    }
    async_params {
        Screenshot(ExportPngParams) => media::screenshot, "canvas:screenshot";
        ExportPng(ExportPngParams) => media::export_png, "export:png";
        ImportImage(ImportImageParams) => media::import_image, "image:import";
        SaveProject(ProjectFileParams) => project::save, "project:save";
        LoadProject(ProjectFileParams) => project::load, "project:load";
    }
}
