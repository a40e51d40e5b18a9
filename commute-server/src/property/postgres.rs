//! PostGIS-backed property search.

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};
use tracing::{debug, warn};

use crate::domain::{Property, PropertyStationGroup, Station, StationCode};

use super::{PropertyError, PropertyFilter, PropertySearch};

/// `properties.location` and `stations.location` are `geography` points, so
/// `ST_DWithin` works in metres.
const NEAR_STATIONS: &str = "
    SELECT p.id::text AS property_id,
           ST_X(p.location::geometry) AS property_lon,
           ST_Y(p.location::geometry) AS property_lat,
           p.address,
           p.price::bigint AS price,
           p.bedrooms::int4 AS bedrooms,
           p.bathrooms::int4 AS bathrooms,
           s.id::text AS station_id,
           s.name AS station_name,
           ST_X(s.location::geometry) AS station_lon,
           ST_Y(s.location::geometry) AS station_lat
    FROM properties AS p
    JOIN stations AS s ON ST_DWithin(p.location, s.location, $1)
    WHERE p.price <= $2
      AND ($3::bigint IS NULL OR p.price >= $3)
      AND ($4::int4 IS NULL OR p.bedrooms >= $4)
      AND ($5::int4 IS NULL OR p.bedrooms <= $5)
      AND ($6::int4 IS NULL OR p.bathrooms >= $6)
      AND ($7::int4 IS NULL OR p.bathrooms <= $7)
    ORDER BY s.id, p.id
";

/// Property search over the `properties` and `stations` tables.
#[derive(Debug, Clone)]
pub struct PgPropertySearch {
    pool: PgPool,
}

impl PgPropertySearch {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn station_from_row(row: &PgRow, id: StationCode) -> Result<Station, sqlx::Error> {
    Ok(Station {
        id,
        name: row.try_get("station_name")?,
        location: (row.try_get("station_lon")?, row.try_get("station_lat")?),
    })
}

fn property_from_row(row: &PgRow) -> Result<Property, sqlx::Error> {
    Ok(Property {
        id: row.try_get("property_id")?,
        location: (row.try_get("property_lon")?, row.try_get("property_lat")?),
        address: row.try_get("address")?,
        price: row.try_get("price")?,
        bedrooms: row.try_get("bedrooms")?,
        bathrooms: row.try_get("bathrooms")?,
    })
}

#[async_trait]
impl PropertySearch for PgPropertySearch {
    async fn find_near_stations(
        &self,
        filter: &PropertyFilter,
    ) -> Result<Vec<PropertyStationGroup>, PropertyError> {
        filter.validate()?;

        let rows = sqlx::query(NEAR_STATIONS)
            .bind(filter.max_station_distance)
            .bind(filter.max_price)
            .bind(filter.min_price)
            .bind(filter.min_bedrooms)
            .bind(filter.max_bedrooms)
            .bind(filter.min_bathrooms)
            .bind(filter.max_bathrooms)
            .fetch_all(&self.pool)
            .await?;

        debug!(rows = rows.len(), "Property search");

        // Rows arrive sorted by station, so a group ends when the id changes.
        let mut groups: Vec<PropertyStationGroup> = Vec::new();
        for row in &rows {
            let raw_id: String = row.try_get("station_id")?;
            let id = match StationCode::parse(&raw_id) {
                Ok(id) => id,
                Err(e) => {
                    warn!(station = %raw_id, error = %e, "Skipping station with unusable code");
                    continue;
                }
            };

            let property = property_from_row(row)?;
            if let Some(group) = groups.last_mut().filter(|g| g.station.id == id) {
                group.properties.push(property);
                continue;
            }
            groups.push(PropertyStationGroup {
                station: station_from_row(row, id)?,
                properties: vec![property],
            });
        }

        Ok(groups)
    }
}
