use core::fmt::Write;

use heapless::{String, Vec};

use crate::config::{MAX_REQUEST_ACCESS_POINTS, REQUEST_BODY_MAX};
use crate::error::GeolocationError;
use crate::types::AccessPointObservation;

pub type RequestBody = String<REQUEST_BODY_MAX>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeolocationRequest {
    pub consider_ip: bool,
    pub observations: Vec<AccessPointObservation, MAX_REQUEST_ACCESS_POINTS>,
}

impl GeolocationRequest {
    /// Keeps the first ten observations as supplied. Callers that want the
    /// strongest access points must sort before calling.
    pub fn from_observations(
        observations: &[AccessPointObservation],
    ) -> Result<Self, GeolocationError> {
        if observations.is_empty() {
            return Err(GeolocationError::InvalidArgument);
        }

        let take = observations.len().min(MAX_REQUEST_ACCESS_POINTS);
        let observations = Vec::from_slice(&observations[..take])
            .map_err(|_| GeolocationError::AllocationError)?;

        Ok(Self {
            consider_ip: false,
            observations,
        })
    }

    pub fn serialize(&self) -> Result<RequestBody, GeolocationError> {
        let mut body = RequestBody::new();
        write_body(&mut body, self).map_err(|_| GeolocationError::AllocationError)?;
        Ok(body)
    }
}

pub fn build_request_body(
    observations: &[AccessPointObservation],
) -> Result<RequestBody, GeolocationError> {
    let body = GeolocationRequest::from_observations(observations)?.serialize()?;
    log::debug!("geolocation: request json ({} bytes): {}", body.len(), body);
    Ok(body)
}

fn write_body(out: &mut RequestBody, request: &GeolocationRequest) -> core::fmt::Result {
    write!(
        out,
        "{{\"considerIp\":{},\"wifiAccessPoints\":[",
        request.consider_ip
    )?;
    for (idx, ap) in request.observations.iter().enumerate() {
        if idx > 0 {
            out.write_char(',')?;
        }
        write!(
            out,
            "{{\"macAddress\":\"{}\",\"signalStrength\":{},\"channel\":{}}}",
            ap.mac_address, ap.signal_strength, ap.channel
        )?;
    }
    out.write_str("]}")
}
