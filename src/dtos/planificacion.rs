use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::inventory::parse::LenientText;
use crate::models::crew::{Equipo, Technician};
use crate::models::solicitud::Solicitud;

/// Tells "field absent" apart from "field sent as null".
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Serialize)]
pub struct PlannedSolicitud {
    #[serde(flatten)]
    pub solicitud: Solicitud,
    pub team_tecnico_1_id: Option<i64>,
    pub team_tecnico_2_id: Option<i64>,
}

#[derive(Serialize)]
pub struct DayPlanResponse {
    pub solicitudes: Vec<PlannedSolicitud>,
    pub technicians: Vec<Technician>,
    pub equipos: Vec<Equipo>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub solicitud_id: LenientText,
    pub equipo: String,
    pub tecnico1: Option<LenientText>,
    pub tecnico2: Option<LenientText>,
    pub fecha_asignada: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct UnassignRequest {
    pub solicitud_id: LenientText,
}

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub letra: String,
    pub tecnico_1_id: Option<LenientText>,
    pub tecnico_2_id: Option<LenientText>,
}

/// `Some(None)` or a blank value clears a slot; an absent field leaves it alone.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateTeamRequest {
    #[serde(default, deserialize_with = "present")]
    pub tecnico_1_id: Option<Option<LenientText>>,
    #[serde(default, deserialize_with = "present")]
    pub tecnico_2_id: Option<Option<LenientText>>,
}

#[derive(Serialize)]
pub struct MessageResponse<T: Serialize> {
    pub message: String,
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn team_update_distinguishes_absent_from_null() {
        let req: UpdateTeamRequest = serde_json::from_str(r#"{"tecnico_1_id": null}"#).unwrap();
        assert!(matches!(req.tecnico_1_id, Some(None)));
        assert!(req.tecnico_2_id.is_none());

        let req: UpdateTeamRequest = serde_json::from_str(r#"{"tecnico_2_id": "7"}"#).unwrap();
        let slot = req.tecnico_2_id.flatten().and_then(|t| t.to_int());
        assert_eq!(slot, Some(7));
    }
}
