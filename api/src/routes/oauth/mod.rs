pub mod oauth_dto;
pub mod oauth_route;
