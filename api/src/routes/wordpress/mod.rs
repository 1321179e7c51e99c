pub mod wordpress_dto;
pub mod wordpress_route;
