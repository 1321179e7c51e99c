pub mod deploy_dto;
pub mod deploy_route;
