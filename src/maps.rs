//! Static map metadata.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapDef {
  pub id: &'static str,
  pub name: &'static str,
  pub slug: &'static str,
  /// Full-resolution static map image
  pub image: &'static str,
}

pub const MAPS: &[MapDef] = &[
  MapDef {
    id: "dam-battlegrounds",
    name: "Dam Battlegrounds",
    slug: "dam-battlegrounds",
    image: "https://d1jgxp05n383qi.cloudfront.net/map_images/2560x1440/2560x1440-dam-battlegrounds.jpg",
  },
  MapDef {
    id: "stella-montis",
    name: "Stella Montis",
    slug: "stella-montis",
    image: "https://d1jgxp05n383qi.cloudfront.net/map_images/2560x1440/2560x1440-stella-montis.jpg",
  },
  MapDef {
    id: "buried-city",
    name: "Buried City",
    slug: "buried-city",
    image: "https://d1jgxp05n383qi.cloudfront.net/map_images/2560x1440/2560x1440-buried-city.jpg",
  },
  MapDef {
    id: "spaceport",
    name: "Spaceport",
    slug: "spaceport",
    image: "https://d1jgxp05n383qi.cloudfront.net/map_images/2560x1440/2560x1440-spaceport.jpg",
  },
  MapDef {
    id: "the-blue-gate",
    name: "The Blue Gate",
    slug: "the-blue-gate",
    image: "https://d1jgxp05n383qi.cloudfront.net/map_images/2560x1440/2560x1440-the-blue-gate.jpg",
  },
];

pub fn map_by_slug(slug: &str) -> Option<&'static MapDef> {
  MAPS.iter().find(|m| m.slug == slug)
}

/// Interactive MapGenie embed for a map.
pub fn embed_url(map: &MapDef) -> String {
  format!("https://mapgenie.io/arc-raiders/maps/{}?embed=light", map.slug)
}
