/// Rectangle in degrees, `(xmin, ymin, xmax, ymax)` with x as longitude.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    /// Square of half-width `delta` centred on `(lon, lat)`.
    pub fn around(lat: f64, lon: f64, delta: f64) -> Self {
        Self {
            xmin: lon - delta,
            ymin: lat - delta,
            xmax: lon + delta,
            ymax: lat + delta,
        }
    }

    /// `xmin,ymin,xmax,ymax` as the export endpoint expects it.
    pub fn to_query(&self) -> String {
        format!("{},{},{},{}", self.xmin, self.ymin, self.xmax, self.ymax)
    }
}
