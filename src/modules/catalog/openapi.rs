//! OpenAPI fragments contributed by the catalog modules.

use serde_json::{json, Value};

fn schema_ref(name: &str) -> Value {
    json!({ "$ref": format!("#/components/schemas/{name}") })
}

fn json_content(schema: Value) -> Value {
    json!({ "application/json": { "schema": schema } })
}

fn text_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": { "text/plain": { "schema": { "type": "string" } } }
    })
}

fn id_parameter() -> Value {
    json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "integer", "format": "int32" }
    }])
}

/// Paths for one routed entity, relative to its mount point, plus schemas.
pub fn resource(tag: &str, schema: &str) -> Value {
    let entity = schema_ref(schema);

    json!({
        "paths": {
            "": {
                "get": {
                    "summary": format!("List {tag}"),
                    "tags": [tag],
                    "responses": {
                        "200": {
                            "description": "Every row, fully hydrated",
                            "content": json_content(json!({ "type": "array", "items": entity }))
                        },
                        "500": text_response("Internal server error")
                    }
                },
                "post": {
                    "summary": format!("Create {schema}, resolving nested entities"),
                    "tags": [tag],
                    "requestBody": { "required": true, "content": json_content(entity.clone()) },
                    "responses": {
                        "201": { "description": "Created", "content": json_content(entity.clone()) },
                        "409": text_response("Unique constraint violated or id already exists"),
                        "422": text_response("Row rejected by the database")
                    }
                },
                "delete": {
                    "summary": format!("Delete {tag} by id"),
                    "tags": [tag],
                    "requestBody": { "required": true, "content": json_content(schema_ref("IdList")) },
                    "responses": {
                        "200": {
                            "description": "Ids that could not be found",
                            "content": json_content(schema_ref("IdList"))
                        },
                        "204": { "description": "All rows deleted" }
                    }
                }
            },
            "/{id}": {
                "parameters": id_parameter(),
                "get": {
                    "summary": format!("Get {schema}"),
                    "tags": [tag],
                    "responses": {
                        "200": { "description": "OK", "content": json_content(entity.clone()) },
                        "404": text_response("No row with that id")
                    }
                },
                "patch": {
                    "summary": format!("Update supplied {schema} fields"),
                    "description": "Empty strings and zero numbers count as not supplied.",
                    "tags": [tag],
                    "requestBody": { "required": true, "content": json_content(entity.clone()) },
                    "responses": {
                        "200": { "description": "Updated row, or a message when nothing changed" },
                        "404": text_response("No row with that id"),
                        "409": text_response("Unique constraint violated")
                    }
                },
                "delete": {
                    "summary": format!("Delete {schema}"),
                    "tags": [tag],
                    "responses": {
                        "200": text_response("No row with that id"),
                        "204": { "description": "Deleted" },
                        "409": text_response("Row is still referenced")
                    }
                }
            }
        },
        "components": { "schemas": schemas() }
    })
}

/// Schemas only, for entities reachable solely through cascades.
pub fn schemas_only() -> Value {
    json!({ "components": { "schemas": schemas() } })
}

fn schemas() -> Value {
    let string = json!({ "type": "string" });
    let date_time = json!({ "type": "string", "format": "date-time" });
    let id = json!({ "type": "integer", "format": "int32" });

    json!({
        "Location": {
            "type": "object",
            "properties": {
                "id": id,
                "city": string,
                "country": string,
                "region": string
            }
        },
        "Author": {
            "type": "object",
            "properties": {
                "id": id,
                "firstName": string,
                "lastName": string,
                "gender": string,
                "dateOfBirth": date_time,
                "placeOfBirth": schema_ref("Location")
            }
        },
        "Work": {
            "type": "object",
            "properties": {
                "id": id,
                "description": string,
                "initialPubDate": date_time,
                "originalLanguage": string,
                "title": string,
                "author": schema_ref("Author")
            }
        },
        "Publication": {
            "type": "object",
            "properties": {
                "id": id,
                "editionPubDate": date_time,
                "format": string,
                "imageUrl": string,
                "isbn": string,
                "isbn13": string,
                "language": string,
                "numPages": id,
                "publisher": string,
                "work": schema_ref("Work")
            }
        },
        "IdList": {
            "type": "object",
            "properties": {
                "ids": { "type": "array", "items": id }
            },
            "required": ["ids"]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_paths_are_relative_to_mount_point() {
        let fragment = resource("works", "Work");
        let paths = fragment["paths"].as_object().unwrap();
        assert!(paths.contains_key(""));
        assert!(paths.contains_key("/{id}"));
        assert_eq!(
            fragment["paths"][""]["post"]["requestBody"]["content"]["application/json"]["schema"]
                ["$ref"],
            "#/components/schemas/Work"
        );
    }

    #[test]
    fn every_fragment_carries_all_schemas() {
        let fragment = schemas_only();
        for name in ["Location", "Author", "Work", "Publication", "IdList"] {
            assert!(fragment["components"]["schemas"].get(name).is_some(), "{name}");
        }
    }
}
